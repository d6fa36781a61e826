//! Capability-grounded generation of media conversion shell commands.
//!
//! The pipeline: probe the local toolchain (ffmpeg, ImageMagick), serialize
//! the detected capabilities into a system prompt, dispatch the prompt to a
//! remote chat backend or a local agent CLI, and defensively validate the
//! free-text reply into a structurally guaranteed command list. Validation
//! failures feed an operator-driven retry/edit/cancel loop.

mod capability;
mod error;
mod prompt;
mod provider;
mod recovery;
mod response;

pub use capability::detect_capabilities;
pub use capability::CapabilityProber;
pub use capability::CapabilitySnapshot;
pub use capability::ImageToolCaps;
pub use capability::TranscoderCaps;
pub use error::ConvertError;
pub use error::ConvertResult;
pub use prompt::build_system_prompt;
pub use prompt::build_user_prompt;
pub use provider::agent_binary_available;
pub use provider::GenerationRequest;
pub use provider::Generator;
pub use provider::ProviderClient;
pub use provider::ProviderConfig;
pub use provider::ProviderKind;
pub use provider::RemoteCredentials;
pub use recovery::generate_with_recovery;
pub use recovery::ConversionOutcome;
pub use recovery::Operator;
pub use recovery::RecoveryChoice;
pub use response::validate_response;
pub use response::GenerateResult;
pub use response::ValidationFailure;
