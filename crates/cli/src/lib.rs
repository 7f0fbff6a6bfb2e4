pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "opsroute",
    about = "Guardrailed intent-routing assistant for ops questions",
    long_about = "Routes ops questions to a world-time tool, a runbook search index, or a general advice path, with deterministic guardrails in front of every model call.",
    after_help = "Examples:\n  opsroute chat\n  opsroute config\n  opsroute doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start the interactive assistant loop (type `exit` to quit)")]
    Chat {
        #[arg(long, value_name = "PATH", help = "Path to an opsroute.toml config file")]
        config: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config {
        #[arg(long, value_name = "PATH", help = "Path to an opsroute.toml config file")]
        config: Option<PathBuf>,
    },
    #[command(about = "Validate configuration and probe the Ollama backend")]
    Doctor {
        #[arg(long, value_name = "PATH", help = "Path to an opsroute.toml config file")]
        config: Option<PathBuf>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Chat { config } => match commands::chat::run(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::FAILURE
            }
        },
        Command::Config { config } => {
            println!("{}", commands::config::run(config));
            ExitCode::SUCCESS
        }
        Command::Doctor { config, json } => {
            let (output, healthy) = commands::doctor::run(config, json).await;
            println!("{output}");
            if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
