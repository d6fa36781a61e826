//! ffmpeg self-report probes and banner parsers.

use std::collections::BTreeSet;

use tokio::process::Command;
use tracing::debug;

use super::TranscoderCaps;

const BINARY: &str = "ffmpeg";

/// Probe ffmpeg. The version, encoder, and decoder queries have no ordering
/// dependency and run concurrently.
pub(super) async fn probe() -> TranscoderCaps {
    let (version, encoders, decoders) = tokio::join!(
        run(&["-version"]),
        run(&["-hide_banner", "-encoders"]),
        run(&["-hide_banner", "-decoders"]),
    );

    let Some(version_banner) = version else {
        debug!("ffmpeg not detected; transcoder capabilities disabled");
        return TranscoderCaps::default();
    };

    let (video_encoders, audio_encoders) = encoders
        .as_deref()
        .map(parse_codec_table)
        .unwrap_or_default();
    let decoders = decoders
        .as_deref()
        .map(|table| {
            let (video, audio) = parse_codec_table(table);
            video.into_iter().chain(audio).collect()
        })
        .unwrap_or_default();

    TranscoderCaps {
        installed: true,
        version: parse_version_banner(&version_banner),
        video_encoders,
        audio_encoders,
        decoders,
    }
}

async fn run(args: &[&str]) -> Option<String> {
    match Command::new(BINARY).args(args).output().await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!(status = %output.status, ?args, "ffmpeg probe exited with failure");
            None
        }
        Err(err) => {
            debug!(error = %err, ?args, "ffmpeg probe could not be spawned");
            None
        }
    }
}

/// First banner line: `ffmpeg version 6.1.1 Copyright (c) 2000-2023 ...`.
fn parse_version_banner(banner: &str) -> Option<String> {
    let first = banner.lines().next()?;
    let mut words = first.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("ffmpeg"), Some("version"), Some(version)) => Some(version.to_string()),
        _ => None,
    }
}

/// Codec tables print a flag legend, a `------` separator, then rows like
/// ` V..... libx264              libx264 H.264 / AVC / MPEG-4 AVC`.
/// The first flag character classifies the codec; subtitle rows and lines
/// that do not match the shape are skipped rather than failing the probe.
fn parse_codec_table(table: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut video = BTreeSet::new();
    let mut audio = BTreeSet::new();
    let mut in_body = false;

    for line in table.lines() {
        if !in_body {
            in_body = line.trim_start().starts_with("------");
            continue;
        }
        let mut words = line.split_whitespace();
        let (Some(flags), Some(name)) = (words.next(), words.next()) else {
            continue;
        };
        match flags.chars().next() {
            Some('V') => {
                video.insert(name.to_string());
            }
            Some('A') => {
                audio.insert(name.to_string());
            }
            _ => {}
        }
    }

    (video, audio)
}
