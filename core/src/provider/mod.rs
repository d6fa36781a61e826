//! Generation backends and the dispatch across them.
//!
//! The backend set is closed and small, so dispatch is a single match over
//! [`ProviderKind`] rather than an interface hierarchy. The [`Generator`]
//! trait exists for one capability only: produce raw reply text from a
//! generation request, so the recovery loop can be driven by scripted
//! backends in tests.

mod local;
mod remote;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, ConvertResult};

pub use local::agent_binary_available;

/// Which backend produces the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "remote")]
    RemoteChat,
    #[serde(rename = "local")]
    LocalAgent,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::RemoteChat => write!(f, "remote chat"),
            ProviderKind::LocalAgent => write!(f, "local agent"),
        }
    }
}

/// Opaque account identifier plus secret token for the remote backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub account_id: String,
    pub api_token: String,
}

/// Everything the dispatcher needs to reach one backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub remote_credentials: Option<RemoteCredentials>,
    pub model: String,
    pub base_url: String,
    pub agent_binary: String,
}

impl ProviderConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.cloudflare.com/client/v4";
    pub const DEFAULT_MODEL: &'static str = "@cf/meta/llama-3.1-8b-instruct";
    pub const DEFAULT_AGENT_BINARY: &'static str = "claude";

    pub fn remote_chat(credentials: RemoteCredentials, model: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::RemoteChat,
            remote_credentials: Some(credentials),
            model: model.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            agent_binary: Self::DEFAULT_AGENT_BINARY.to_string(),
        }
    }

    pub fn local_agent(binary: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::LocalAgent,
            remote_credentials: None,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            agent_binary: binary.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fail-fast check at the configuration boundary, before any dispatch.
    pub fn validate(&self) -> ConvertResult<()> {
        match self.kind {
            ProviderKind::RemoteChat => {
                let credentials = self.remote_credentials.as_ref().ok_or_else(|| {
                    ConvertError::config("remote provider selected but no credentials configured")
                })?;
                if credentials.account_id.is_empty() || credentials.api_token.is_empty() {
                    return Err(ConvertError::config("remote credentials are incomplete"));
                }
            }
            ProviderKind::LocalAgent => {
                if self.agent_binary.is_empty() {
                    return Err(ConvertError::config("local agent binary is not configured"));
                }
            }
        }
        Ok(())
    }
}

/// One generation attempt. Built fresh per attempt: the user prompt may
/// change between retries, the system prompt does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Produce raw, unvalidated reply text from a generation request.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> ConvertResult<String>;
}

/// Dispatches requests to the configured backend. Never parses or
/// interprets the reply body; that is the validator's job.
pub struct ProviderClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl ProviderClient {
    /// Remote calls carry a request timeout so a hung endpoint cannot block
    /// the loop forever; the local agent path is unbounded (see DESIGN.md).
    const REMOTE_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(config: ProviderConfig) -> ConvertResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Self::REMOTE_TIMEOUT)
            .build()
            .map_err(|err| ConvertError::backend("remote chat", err.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl Generator for ProviderClient {
    async fn generate(&self, request: &GenerationRequest) -> ConvertResult<String> {
        match self.config.kind {
            ProviderKind::RemoteChat => remote::complete(&self.http, &self.config, request).await,
            ProviderKind::LocalAgent => local::complete(&self.config, request).await,
        }
    }
}
