//! The conversion path: probe, prompt, generate, recover, act.

use anyhow::{anyhow, Result};
use colored::*;
use tracing::debug;

use aiconv_core::{
    agent_binary_available, build_system_prompt, detect_capabilities, generate_with_recovery,
    CapabilityProber, ConversionOutcome, ProviderClient, ProviderKind,
};

use crate::config::{self, ConfigStore};
use crate::ui;

pub async fn run(request: &str, override_kind: Option<ProviderKind>) -> Result<()> {
    if request.trim().is_empty() {
        return Err(anyhow!(
            "describe the conversion, e.g. `aiconv \"turn screencast.mov into a small mp4\"`"
        ));
    }

    // Fail fast on configuration before probing or spending a model call.
    let mut store = ConfigStore::open()?;
    let settings = store.load().await?;
    let provider_config = config::resolve_provider(settings, override_kind)?;
    debug!(provider = %provider_config.kind, "resolved provider configuration");

    ui::banner();

    println!("{}", "🔍 Detecting local tools...".blue());
    let prober = CapabilityProber::new();
    let snapshot = prober.snapshot().await;
    ui::print_capabilities(snapshot);

    if !snapshot.any_tool_installed() {
        println!(
            "{}",
            "Neither ffmpeg nor magick was found; the reply can only say the conversion is not possible."
                .yellow()
        );
    }

    let system_prompt = build_system_prompt(snapshot);
    let client = ProviderClient::new(provider_config)?;

    println!(
        "{} {}",
        "🤖 Generating with the".blue(),
        format!("{} backend", client.config().kind).cyan()
    );

    let mut operator = ui::InteractiveOperator;
    let outcome =
        generate_with_recovery(&client, &system_prompt, request.to_string(), &mut operator)
            .await?;

    match outcome {
        ConversionOutcome::Cancelled => {
            println!("{}", "Cancelled.".yellow());
            Ok(())
        }
        ConversionOutcome::Completed(result) => ui::action_loop(result).await,
    }
}

/// Show configuration state and the detected capability snapshot.
pub async fn show_status() -> Result<()> {
    ui::banner();

    let mut store = ConfigStore::open()?;
    let settings = store.load().await?;

    println!("{}", "⚙️ Configuration:".blue());
    match settings {
        None => println!(
            "   {}",
            "not configured (run `aiconv configure`)".yellow()
        ),
        Some(settings) => {
            println!(
                "   Default provider: {}",
                settings.default_provider.to_string().cyan()
            );
            if let Some(remote) = &settings.remote {
                println!("   Account: {}", remote.account_id.bright_black());
                println!("   Model: {}", remote.model.bright_black());
            }
            let agent_state = if agent_binary_available(&settings.local.binary) {
                "found on PATH".green()
            } else {
                "not found on PATH".yellow()
            };
            println!(
                "   Local agent: {} ({})",
                settings.local.binary.bright_black(),
                agent_state
            );
        }
    }

    println!();
    println!("{}", "🔍 Detected tools:".blue());
    let snapshot = detect_capabilities().await;
    ui::print_capabilities(&snapshot);

    Ok(())
}
