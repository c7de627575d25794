use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tagscroll::app::AppContext;
use tagscroll::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = cli.load_config()?;
    let ctx = AppContext::new(config)?;

    match &cli.command {
        Commands::Search { tags, json } => {
            commands::search(&ctx, tags, *json).await?;
        }
        Commands::Endpoints { tags } => {
            commands::endpoints(&ctx, tags)?;
        }
        Commands::Tui { tags } => {
            let initial = (!tags.is_empty()).then(|| tags.join(" "));
            tagscroll::tui::run(Arc::new(ctx), initial).await?;
        }
        Commands::Proxy { .. } => {
            commands::proxy(&ctx).await?;
        }
    }

    Ok(())
}

/// Logs go to `--log-file` when given. Without one the TUI logs nowhere,
/// since it owns the terminal, and every other command logs to stderr.
fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        None if matches!(cli.command, Commands::Tui { .. }) => registry.init(),
        None => registry.with(fmt::layer().with_writer(io::stderr)).init(),
    }

    Ok(())
}
