//! Terminal presentation: banner, capability summary, the validation
//! failure prompt, and the post-generation action menu.

use anyhow::Result;
use async_trait::async_trait;
use colored::*;
use dialoguer::{Input, Select};

use aiconv_core::{
    CapabilitySnapshot, ConvertError, ConvertResult, GenerateResult, Operator, RecoveryChoice,
    ValidationFailure,
};

use crate::exec;

pub fn banner() {
    println!("{}", "aiconv".cyan().bold());
    println!("{}", "plain-language media conversion".bright_black());
    println!();
}

pub fn print_capabilities(snapshot: &CapabilitySnapshot) {
    if snapshot.transcoder.installed {
        println!(
            "   {} ffmpeg {} ({} video encoders, {} audio encoders)",
            "✅".green(),
            snapshot.transcoder.version.as_deref().unwrap_or("(unknown version)"),
            snapshot.transcoder.video_encoders.len(),
            snapshot.transcoder.audio_encoders.len()
        );
    } else {
        println!("   {} ffmpeg not found", "❌".red());
    }
    if snapshot.image_tool.installed {
        println!(
            "   {} magick {} ({} image formats)",
            "✅".green(),
            snapshot.image_tool.version.as_deref().unwrap_or("(unknown version)"),
            snapshot.image_tool.formats.len()
        );
    } else {
        println!("   {} magick not found", "❌".red());
    }
}

/// Presents a failed reply and asks for exactly one of the three
/// continuations the recovery loop understands.
pub struct InteractiveOperator;

#[async_trait]
impl Operator for InteractiveOperator {
    async fn on_validation_failure(
        &mut self,
        failure: &ValidationFailure,
    ) -> ConvertResult<RecoveryChoice> {
        println!();
        println!("{} {}", "❌ The reply could not be used:".red(), failure.reason);
        println!("{}", "Raw reply:".bright_black());
        for line in failure.raw.lines() {
            println!("   {}", line.bright_black());
        }
        println!();

        let items = ["Retry", "Edit the request", "Cancel"];
        let choice = Select::new()
            .with_prompt("What next")
            .items(&items)
            .default(0)
            .interact()
            .map_err(interaction_error)?;

        match choice {
            0 => Ok(RecoveryChoice::Retry),
            1 => {
                let edited: String = Input::new()
                    .with_prompt("New request")
                    .interact_text()
                    .map_err(interaction_error)?;
                Ok(RecoveryChoice::Edit(edited))
            }
            _ => Ok(RecoveryChoice::Cancel),
        }
    }
}

fn interaction_error(err: dialoguer::Error) -> ConvertError {
    ConvertError::Interaction(err.to_string())
}

/// Present the validated result and act on it. The command list can be
/// edited in place before running or copying.
pub async fn action_loop(mut result: GenerateResult) -> Result<()> {
    loop {
        print_result(&result);

        if result.commands.is_empty() {
            return Ok(());
        }

        let items = [
            "Run the commands",
            "Edit the commands",
            "Copy to clipboard",
            "Quit",
        ];
        match Select::new()
            .with_prompt("Action")
            .items(&items)
            .default(0)
            .interact()?
        {
            0 => return exec::run_all(&result.commands).await,
            1 => result.commands = edit_commands(result.commands)?,
            2 => copy_to_clipboard(&result.commands)?,
            _ => return Ok(()),
        }
    }
}

fn print_result(result: &GenerateResult) {
    println!();
    println!("{}", "📋 Proposed commands:".blue().bold());
    if result.commands.is_empty() {
        println!(
            "   {}",
            "(none; the request cannot be satisfied with the detected tools)".yellow()
        );
    }
    for (index, command) in result.commands.iter().enumerate() {
        println!(
            "   {} {}",
            format!("{}.", index + 1).bright_black(),
            command.cyan()
        );
    }
    println!();
    println!("{} {}", "💡".blue(), result.explanation);
    println!();
}

fn edit_commands(commands: Vec<String>) -> Result<Vec<String>> {
    let mut edited = Vec::with_capacity(commands.len());
    for command in commands {
        let line: String = Input::new()
            .with_prompt("Command (leave empty to drop)")
            .with_initial_text(command)
            .allow_empty(true)
            .interact_text()?;
        if !line.trim().is_empty() {
            edited.push(line);
        }
    }
    Ok(edited)
}

fn copy_to_clipboard(commands: &[String]) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(commands.join("\n"))?;
    println!("{} Copied.", "✅".green());
    Ok(())
}
