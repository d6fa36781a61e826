//! Prompt construction for the command generator.
//!
//! Pure functions: the same snapshot always yields the same bytes. Section
//! order is load-bearing. The model weights later content more heavily, so
//! the output contract (the rules) always comes last, after the detected
//! environment and the static format reference.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::capability::{CapabilitySnapshot, ImageToolCaps, TranscoderCaps};

/// Common output targets mapped to the encoders they need, so the model can
/// cross-check a requested target against the detected encoder lists.
const FORMAT_ENCODERS: &[(&str, &str)] = &[
    ("mp4 (H.264)", "libx264 video + aac audio"),
    ("mp4 (H.265)", "libx265 video + aac audio"),
    ("webm", "libvpx-vp9 video + libopus audio"),
    ("mkv", "any detected video + audio encoder pair"),
    ("gif", "gif"),
    ("mp3", "libmp3lame"),
    ("m4a / aac", "aac"),
    ("opus", "libopus"),
    ("flac", "flac"),
    ("wav", "pcm_s16le"),
    ("png / jpg / webp / avif stills", "the image tool's format list"),
];

const INTRO: &str = "\
You are a media conversion assistant running on the user's machine. You \
translate a natural-language conversion request into shell commands for the \
locally installed tools described below. Those tools are the only programs \
you may invoke.";

const RULES: &str = "\
1. Reply with a single JSON object with exactly two fields: \"commands\", an \
array of strings, and \"explanation\", a string. No other top-level fields.
2. Every element of \"commands\" must be one complete shell command, \
runnable exactly as written. Never use placeholder tokens such as \
<input> or YOUR_FILE. Never use shell control or sequencing syntax: no &&, \
no ;, no |, no $( ), no backticks, no redirection.
3. \"explanation\" is plain prose for a non-technical reader. No code, no \
flags, no file paths.
4. Before a command uses an encoder or image format, confirm it appears in \
the detected environment section above. If the transcoder cannot satisfy \
the request, fall back to the image tool when its format list can. If \
neither tool can, return an empty \"commands\" array and say why in \
\"explanation\".
5. Never overwrite an input file: name each output by appending _converted \
before the extension. When the request names no file, infer a plausible \
filename from the request.
6. Your entire reply must be the JSON object alone. No surrounding prose, \
no markdown fences.";

/// Build the system prompt from a capability snapshot. Deterministic and
/// free of I/O; the capability sets are ordered, so equal snapshots produce
/// byte-identical prompts.
pub fn build_system_prompt(snapshot: &CapabilitySnapshot) -> String {
    let mut prompt = String::new();

    prompt.push_str(INTRO);
    prompt.push_str("\n\n## Detected environment\n\n");
    write_transcoder_section(&mut prompt, &snapshot.transcoder);
    write_image_tool_section(&mut prompt, &snapshot.image_tool);

    prompt.push_str("\n## Output format reference\n\n");
    for (format, requirement) in FORMAT_ENCODERS {
        let _ = writeln!(prompt, "- {format}: needs {requirement}");
    }

    prompt.push_str("\n## Rules\n\n");
    prompt.push_str(RULES);

    prompt
}

/// The user prompt is the operator's request, passed through verbatim. Any
/// editing happens upstream in the recovery loop.
pub fn build_user_prompt(request: &str) -> String {
    request.to_string()
}

fn write_transcoder_section(out: &mut String, caps: &TranscoderCaps) {
    if !caps.installed {
        out.push_str("ffmpeg: not installed. Do not emit ffmpeg commands.\n");
        return;
    }
    match &caps.version {
        Some(version) => {
            let _ = writeln!(out, "ffmpeg: installed (version {version})");
        }
        None => out.push_str("ffmpeg: installed\n"),
    }
    write_name_set(out, "video encoders", &caps.video_encoders);
    write_name_set(out, "audio encoders", &caps.audio_encoders);
    write_name_set(out, "decoders", &caps.decoders);
}

fn write_image_tool_section(out: &mut String, caps: &ImageToolCaps) {
    if !caps.installed {
        out.push_str("magick: not installed. Do not emit magick commands.\n");
        return;
    }
    match &caps.version {
        Some(version) => {
            let _ = writeln!(out, "magick: installed (version {version})");
        }
        None => out.push_str("magick: installed\n"),
    }
    write_name_set(out, "image formats", &caps.formats);
}

fn write_name_set(out: &mut String, label: &str, names: &BTreeSet<String>) {
    if names.is_empty() {
        let _ = writeln!(out, "  {label}: none detected");
    } else {
        let joined = names.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        let _ = writeln!(out, "  {label}: {joined}");
    }
}
