//! ImageMagick self-report probes and banner parsers.

use std::collections::BTreeSet;

use tokio::process::Command;
use tracing::debug;

use super::ImageToolCaps;

const BINARY: &str = "magick";

pub(super) async fn probe() -> ImageToolCaps {
    let (version, formats) = tokio::join!(run(&["-version"]), run(&["-list", "format"]));

    let Some(version_banner) = version else {
        debug!("magick not detected; image tool capabilities disabled");
        return ImageToolCaps::default();
    };

    ImageToolCaps {
        installed: true,
        version: parse_version_banner(&version_banner),
        formats: formats.as_deref().map(parse_format_table).unwrap_or_default(),
    }
}

async fn run(args: &[&str]) -> Option<String> {
    match Command::new(BINARY).args(args).output().await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!(status = %output.status, ?args, "magick probe exited with failure");
            None
        }
        Err(err) => {
            debug!(error = %err, ?args, "magick probe could not be spawned");
            None
        }
    }
}

/// Version banner: `Version: ImageMagick 7.1.1-29 Q16-HDRI x86_64 ...`.
fn parse_version_banner(banner: &str) -> Option<String> {
    for line in banner.lines() {
        let mut words = line.split_whitespace();
        if words.next() == Some("Version:") && words.next() == Some("ImageMagick") {
            return words.next().map(str::to_string);
        }
    }
    None
}

/// Format listing: a header, a dashed separator, then rows like
/// `     PNG* PNG       rw-   Portable Network Graphics`.
/// The trailing `*` is a support marker, not part of the name. The legend
/// printed after the table ("r read support", ...) fails the mode-column
/// check and is skipped, as is any other unrecognized line.
fn parse_format_table(table: &str) -> BTreeSet<String> {
    let mut formats = BTreeSet::new();
    let mut in_body = false;

    for line in table.lines() {
        if !in_body {
            in_body = line.trim_start().starts_with("----");
            continue;
        }
        let mut words = line.split_whitespace();
        let (Some(name), Some(_module), Some(mode)) = (words.next(), words.next(), words.next())
        else {
            continue;
        };
        if mode.len() != 3 || !mode.chars().all(|c| matches!(c, 'r' | 'w' | '+' | '-')) {
            continue;
        }
        let name = name.trim_end_matches('*');
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            continue;
        }
        formats.insert(name.to_ascii_lowercase());
    }

    formats
}
