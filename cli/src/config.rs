//! Stored provider settings and the interactive configure/remove flows.
//!
//! The settings file is the injected configuration source the conversion
//! path reads at startup; credential storage beyond it (rotation, secret
//! stores) is out of scope here.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use colored::*;
use dialoguer::{Input, Password, Select};
use serde::{Deserialize, Serialize};
use tokio::fs;

use aiconv_core::{
    agent_binary_available, ProviderConfig, ProviderKind, RemoteCredentials,
};

use crate::ui;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub default_provider: ProviderKind,
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
    #[serde(default)]
    pub local: LocalSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub account_id: String,
    pub api_token: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    pub binary: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            binary: ProviderConfig::DEFAULT_AGENT_BINARY.to_string(),
        }
    }
}

/// Cached load state. "Confirmed absent" is remembered so a missing file is
/// not re-checked on every demand within one invocation.
enum StoredConfig {
    Unloaded,
    Absent,
    Present(Settings),
}

pub struct ConfigStore {
    path: PathBuf,
    cached: StoredConfig,
}

impl ConfigStore {
    pub fn open() -> Result<Self> {
        Ok(Self {
            path: config_file()?,
            cached: StoredConfig::Unloaded,
        })
    }

    #[cfg(test)]
    fn at(path: PathBuf) -> Self {
        Self {
            path,
            cached: StoredConfig::Unloaded,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&mut self) -> Result<Option<&Settings>> {
        if matches!(self.cached, StoredConfig::Unloaded) {
            self.cached = match fs::read_to_string(&self.path).await {
                Ok(contents) => {
                    let settings = serde_yaml::from_str(&contents).with_context(|| {
                        format!("invalid configuration file {}", self.path.display())
                    })?;
                    StoredConfig::Present(settings)
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoredConfig::Absent,
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("could not read {}", self.path.display())
                    });
                }
            };
        }
        match &self.cached {
            StoredConfig::Present(settings) => Ok(Some(settings)),
            _ => Ok(None),
        }
    }

    pub async fn save(&mut self, settings: Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }
        fs::write(&self.path, serde_yaml::to_string(&settings)?).await?;
        self.cached = StoredConfig::Present(settings);
        Ok(())
    }

    /// Returns whether a stored configuration actually existed.
    pub async fn delete(&mut self) -> Result<bool> {
        let existed = match fs::remove_file(&self.path).await {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => return Err(err.into()),
        };
        self.cached = StoredConfig::Absent;
        Ok(existed)
    }
}

fn config_file() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(".aiconv").join("config.yaml"))
}

/// Resolve the provider configuration for one invocation: stored settings,
/// environment overrides, then the --provider flag. Validation happens here,
/// at the configuration boundary, so a broken setup fails before any
/// capability probe or model call.
pub fn resolve_provider(
    settings: Option<&Settings>,
    override_kind: Option<ProviderKind>,
) -> Result<ProviderConfig> {
    let kind = override_kind
        .or(settings.map(|s| s.default_provider))
        .ok_or_else(|| anyhow!("no provider configured; run `aiconv configure` first"))?;

    let config = match kind {
        ProviderKind::RemoteChat => {
            let stored = settings.and_then(|s| s.remote.as_ref());
            let account_id = env_override("AICONV_ACCOUNT_ID")
                .or_else(|| stored.map(|r| r.account_id.clone()));
            let api_token = env_override("AICONV_API_TOKEN")
                .or_else(|| stored.map(|r| r.api_token.clone()));
            let (Some(account_id), Some(api_token)) = (account_id, api_token) else {
                return Err(anyhow!(
                    "the remote provider needs an account id and API token; run `aiconv configure` or set AICONV_ACCOUNT_ID and AICONV_API_TOKEN"
                ));
            };
            let model = stored
                .map(|r| r.model.clone())
                .unwrap_or_else(|| ProviderConfig::DEFAULT_MODEL.to_string());
            ProviderConfig::remote_chat(
                RemoteCredentials {
                    account_id,
                    api_token,
                },
                model,
            )
        }
        ProviderKind::LocalAgent => {
            let binary = settings
                .map(|s| s.local.binary.clone())
                .unwrap_or_else(|| ProviderConfig::DEFAULT_AGENT_BINARY.to_string());
            ProviderConfig::local_agent(binary)
        }
    };

    config.validate()?;
    Ok(config)
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Interactive provider setup.
pub async fn configure() -> Result<()> {
    ui::banner();
    let mut store = ConfigStore::open()?;
    let existing = store.load().await?.cloned();

    let providers = [
        "Remote chat API (Cloudflare Workers AI)",
        "Local agent CLI",
    ];
    let default_index = match existing.as_ref().map(|s| s.default_provider) {
        Some(ProviderKind::LocalAgent) => 1,
        _ => 0,
    };
    let choice = Select::new()
        .with_prompt("Default provider")
        .items(&providers)
        .default(default_index)
        .interact()?;

    let settings = if choice == 0 {
        let stored_remote = existing.as_ref().and_then(|s| s.remote.clone());
        let account_id: String = Input::new()
            .with_prompt("Account id")
            .with_initial_text(
                stored_remote
                    .as_ref()
                    .map(|r| r.account_id.clone())
                    .unwrap_or_default(),
            )
            .interact_text()?;
        let api_token = Password::new().with_prompt("API token").interact()?;
        let model: String = Input::new()
            .with_prompt("Model")
            .default(
                stored_remote
                    .map(|r| r.model)
                    .unwrap_or_else(|| ProviderConfig::DEFAULT_MODEL.to_string()),
            )
            .interact_text()?;
        Settings {
            default_provider: ProviderKind::RemoteChat,
            remote: Some(RemoteSettings {
                account_id,
                api_token,
                model,
            }),
            local: existing.map(|s| s.local).unwrap_or_default(),
        }
    } else {
        let binary: String = Input::new()
            .with_prompt("Agent binary")
            .default(
                existing
                    .as_ref()
                    .map(|s| s.local.binary.clone())
                    .unwrap_or_else(|| ProviderConfig::DEFAULT_AGENT_BINARY.to_string()),
            )
            .interact_text()?;
        if !agent_binary_available(&binary) {
            println!(
                "{} `{}` was not found on PATH; install it before converting",
                "⚠️".yellow(),
                binary
            );
        }
        Settings {
            default_provider: ProviderKind::LocalAgent,
            remote: existing.and_then(|s| s.remote),
            local: LocalSettings { binary },
        }
    };

    store.save(settings).await?;
    println!(
        "{} Configuration saved to {}",
        "✅".green(),
        store.path().display().to_string().bright_black()
    );
    Ok(())
}

pub async fn remove() -> Result<()> {
    let mut store = ConfigStore::open()?;
    if store.delete().await? {
        println!("{} Configuration removed", "✅".green());
    } else {
        println!("{}", "No stored configuration found.".yellow());
    }
    Ok(())
}
