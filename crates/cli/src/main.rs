//! Coverdesk CLI — the main entry point.
//!
//! Commands:
//! - `run`   — Process a file of inbound events through the pipeline
//! - `serve` — Start the HTTP server (inbound webhook + status)

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "coverdesk",
    about = "Coverdesk — assignment orchestration over tiered memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to coverdesk.toml; defaults + env vars when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a JSON-lines file of inbound deliveries
    Run {
        /// Path to the events file (one raw delivery per line)
        #[arg(short, long)]
        events: PathBuf,

        /// Path to a JSON roster file; empty roster when omitted
        #[arg(short, long)]
        roster: Option<PathBuf>,
    },

    /// Start the HTTP server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a JSON roster file; empty roster when omitted
        #[arg(short, long)]
        roster: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => coverdesk_config::AppConfig::load(path)?,
        None => coverdesk_config::AppConfig::from_env()?,
    };

    match cli.command {
        Commands::Run { events, roster } => commands::run::run(&config, &events, roster.as_deref()).await?,
        Commands::Serve { port, roster } => {
            commands::serve::run(&config, port, roster.as_deref()).await?
        }
    }

    Ok(())
}
