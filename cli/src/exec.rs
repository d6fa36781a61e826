//! Sequential execution of the generated commands.

use anyhow::{anyhow, Result};
use colored::*;
use tokio::process::Command;

/// Run each command through the shell with inherited standard streams,
/// halting on the first non-zero exit.
pub async fn run_all(commands: &[String]) -> Result<()> {
    for (index, command) in commands.iter().enumerate() {
        println!(
            "{} {}",
            format!("▶ [{}/{}]", index + 1, commands.len()).blue(),
            command.cyan()
        );
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .await
            .map_err(|err| anyhow!("could not launch `{command}`: {err}"))?;
        if !status.success() {
            return Err(anyhow!("`{command}` exited with {status}"));
        }
    }
    println!("{} All commands completed.", "✅".green());
    Ok(())
}
