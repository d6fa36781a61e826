//! The retry/edit/cancel state machine around generation.
//!
//! This is the only place a [`ValidationFailure`] is consumed. Backend
//! errors are not handled here at all: every resubmission costs a model
//! call, so nothing below the operator is allowed to retry on its own.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ConvertResult;
use crate::prompt::build_user_prompt;
use crate::provider::{GenerationRequest, Generator};
use crate::response::{validate_response, GenerateResult, ValidationFailure};

/// What the operator chose to do about a reply that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryChoice {
    /// Resubmit the same request unchanged.
    Retry,
    /// Replace the request text, then resubmit.
    Edit(String),
    /// Abandon the whole conversion attempt.
    Cancel,
}

/// Terminal state of one conversion attempt. Cancellation is a normal
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Completed(GenerateResult),
    Cancelled,
}

/// Supplies the human decision whenever a reply fails validation. The loop
/// has no retry cap; it is bounded only by this choice, so an unattended
/// caller must impose its own bound.
#[async_trait]
pub trait Operator: Send {
    async fn on_validation_failure(
        &mut self,
        failure: &ValidationFailure,
    ) -> ConvertResult<RecoveryChoice>;
}

/// Drive generation until a reply validates, the operator cancels, or the
/// backend fails. Each cycle rebuilds the user prompt from the current
/// request text against the unchanged system prompt; capabilities are not
/// re-probed mid-loop.
pub async fn generate_with_recovery<G, O>(
    generator: &G,
    system_prompt: &str,
    initial_request: String,
    operator: &mut O,
) -> ConvertResult<ConversionOutcome>
where
    G: Generator + ?Sized,
    O: Operator,
{
    let mut request_text = initial_request;
    loop {
        let request = GenerationRequest {
            system_prompt: system_prompt.to_string(),
            user_prompt: build_user_prompt(&request_text),
        };
        let raw = generator.generate(&request).await?;
        match validate_response(&raw) {
            Ok(result) => {
                debug!(commands = result.commands.len(), "reply validated");
                return Ok(ConversionOutcome::Completed(result));
            }
            Err(failure) => {
                debug!(reason = %failure.reason, "reply failed validation");
                match operator.on_validation_failure(&failure).await? {
                    RecoveryChoice::Retry => {}
                    RecoveryChoice::Edit(new_request) => request_text = new_request,
                    RecoveryChoice::Cancel => return Ok(ConversionOutcome::Cancelled),
                }
            }
        }
    }
}
