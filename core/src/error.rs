use thiserror::Error;

use crate::response::ValidationFailure;

pub type ConvertResult<T, E = ConvertError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Missing or incomplete provider configuration. Fatal before an
    /// attempt starts; never produced mid-loop.
    #[error("configuration error: {0}")]
    Config(String),

    /// The backend could not produce a reply at all (transport failure,
    /// non-success status, subprocess launch failure, non-zero agent exit).
    /// Fatal for the current attempt; never retried automatically.
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// The backend replied, but the reply broke the output contract.
    /// Recoverable; consumed only by the recovery loop.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// An interactive prompt could not be read from the terminal.
    #[error("interaction failed: {0}")]
    Interaction(String),
}

impl ConvertError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
        }
    }
}
