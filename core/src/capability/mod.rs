//! Detection of the local media toolchain.
//!
//! Probing is total: a tool that is missing, cannot be spawned, or answers
//! in an unrecognized format degrades to `installed: false` with empty
//! capability sets. Nothing in this module returns an error.

mod ffmpeg;
mod magick;

use std::collections::BTreeSet;

use tokio::sync::OnceCell;

/// What the transcoder (ffmpeg) reported about itself.
///
/// Invariant: `installed == false` implies `version` is `None` and all sets
/// are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscoderCaps {
    pub installed: bool,
    pub version: Option<String>,
    pub video_encoders: BTreeSet<String>,
    pub audio_encoders: BTreeSet<String>,
    pub decoders: BTreeSet<String>,
}

impl TranscoderCaps {
    pub fn supports_encoder(&self, name: &str) -> bool {
        self.video_encoders.contains(name) || self.audio_encoders.contains(name)
    }
}

/// What the image tool (ImageMagick) reported about itself. Same invariant
/// as [`TranscoderCaps`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageToolCaps {
    pub installed: bool,
    pub version: Option<String>,
    pub formats: BTreeSet<String>,
}

/// The detected inventory of both tools. Sets are ordered so the snapshot
/// serializes into a byte-deterministic prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySnapshot {
    pub transcoder: TranscoderCaps,
    pub image_tool: ImageToolCaps,
}

impl CapabilitySnapshot {
    pub fn any_tool_installed(&self) -> bool {
        self.transcoder.installed || self.image_tool.installed
    }
}

/// Lazily computed, process-lifetime capability snapshot.
///
/// The first demand probes both tools; later demands reuse the result, and
/// a "nothing installed" result is a valid cache entry. Held as an explicit
/// handle rather than ambient global state so callers and tests can inject
/// arbitrary snapshots.
#[derive(Default)]
pub struct CapabilityProber {
    snapshot: OnceCell<CapabilitySnapshot>,
}

impl CapabilityProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> &CapabilitySnapshot {
        self.snapshot.get_or_init(detect_capabilities).await
    }
}

/// Probe both tools concurrently and join the results. Each probe writes
/// its own result slot; there is no shared mutable state between them.
pub async fn detect_capabilities() -> CapabilitySnapshot {
    let (transcoder, image_tool) = tokio::join!(ffmpeg::probe(), magick::probe());
    CapabilitySnapshot {
        transcoder,
        image_tool,
    }
}
