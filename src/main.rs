//! Datalyst - Supervisor-Orchestrated Data Analytics
//!
//! Main entry point for the CLI application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use datalyst::{Config, Repl};

/// Datalyst - Supervisor-Orchestrated Data Analytics
#[derive(Parser, Debug)]
#[command(name = "datalyst")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV dataset to load before the first turn
    #[arg(long, short = 'f')]
    file: Option<String>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Supervisor model (routing decisions)
    #[arg(long, short = 's')]
    supervisor: Option<String>,

    /// Specialist model (tool calling)
    #[arg(long, short = 'e')]
    specialist: Option<String>,

    /// Disable session persistence to disk
    #[arg(long)]
    no_persist: bool,

    /// Enable debug diagnostics
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug {
        "datalyst=debug"
    } else {
        "datalyst=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref supervisor) = args.supervisor {
        config.models.supervisor = supervisor.clone();
    }
    if let Some(ref specialist) = args.specialist {
        config.models.specialist = specialist.clone();
    }
    if args.no_persist {
        config.session.persist = false;
    }

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let mut repl = Repl::with_config(config);
        repl.initialize().await?;
        if let Some(ref file) = args.file {
            repl.stage_upload(file)?;
        }
        repl.process(&prompt).await?;
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config);
    if let Some(ref file) = args.file {
        let absolute = repl.stage_upload(file)?;
        println!("Staged dataset: {}", absolute);
    }
    repl.run().await?;

    Ok(())
}
