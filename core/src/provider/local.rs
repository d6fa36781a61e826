//! Local agent backend: one subprocess per attempt.
//!
//! The agent CLI has no system/user role split, so the two prompts travel
//! as one combined text block. Standard output is captured in full and
//! decoded only after the process exits; the reply is needed whole before
//! validation can run, so there is nothing to stream.

use tokio::process::Command;
use tracing::debug;

use super::{GenerationRequest, ProviderConfig};
use crate::error::{ConvertError, ConvertResult};

const BACKEND: &str = "local agent";

/// Setup-time check that the agent binary resolves on PATH. Generation-time
/// launch failures still surface as backend errors; this exists so the
/// configuration flow can warn the operator early.
pub fn agent_binary_available(binary: &str) -> bool {
    which::which(binary).is_ok()
}

pub(super) async fn complete(
    config: &ProviderConfig,
    request: &GenerationRequest,
) -> ConvertResult<String> {
    let combined = format!("{}\n\n{}", request.system_prompt, request.user_prompt);

    debug!(binary = %config.agent_binary, "invoking local agent");
    let output = Command::new(&config.agent_binary)
        .arg("-p")
        .arg(&combined)
        .output()
        .await
        .map_err(|err| {
            ConvertError::backend(
                BACKEND,
                format!("could not launch `{}`: {err}", config.agent_binary),
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::backend(
            BACKEND,
            format!(
                "`{}` exited with {}: {}",
                config.agent_binary,
                output.status,
                stderr.trim()
            ),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
