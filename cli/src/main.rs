use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use aiconv_core::ProviderKind;

mod config;
mod convert;
mod exec;
mod ui;

#[derive(Parser)]
#[command(name = "aiconv")]
#[command(about = "Turn a plain-language media conversion request into runnable commands")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// The conversion request, in plain language
    request: Vec<String>,

    /// Use a specific backend for this invocation only
    #[arg(short, long, value_enum, global = true)]
    provider: Option<ProviderArg>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the generation backend and credentials
    Configure,

    /// Delete the stored configuration
    Remove,

    /// Show configuration state and detected tool capabilities
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Remote,
    Local,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Remote => ProviderKind::RemoteChat,
            ProviderArg::Local => ProviderKind::LocalAgent,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("aiconv={log_level},aiconv_core={log_level}"))
        .init();

    match cli.command {
        Some(Commands::Configure) => config::configure().await,
        Some(Commands::Remove) => config::remove().await,
        Some(Commands::Status) => convert::show_status().await,
        None => {
            let request = cli.request.join(" ");
            convert::run(&request, cli.provider.map(ProviderKind::from)).await
        }
    }
}
