use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod env;
mod output;

use cli::{Cli, Commands};
use commands::StreamArgs;
use config::ProjectConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    env::load_env_file(&cwd, cli.env.as_deref())?;

    // Rendered lines own stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deltaflood=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ProjectConfig::load(cli.config.as_deref())?;
    let encoder = config.encoder_config(&cli.options)?;

    match cli.command {
        Commands::Stream {
            slot,
            publication,
            create_slot,
            output,
        } => {
            let args = StreamArgs {
                slot,
                publication,
                create_slot,
                output,
            };
            commands::cmd_stream(&config, encoder, args).await
        }
        Commands::Render { input, output } => {
            commands::cmd_render(encoder, &input, output.as_deref())
        }
        Commands::Check => commands::cmd_check(&config, &encoder),
    }
}
