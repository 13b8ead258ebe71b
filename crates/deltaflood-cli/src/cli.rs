use std::path::PathBuf;

use clap::{Parser, Subcommand};
use deltaflood_config::PluginOption;

#[derive(Parser)]
#[command(name = "deltaflood")]
#[command(about = "Render Postgres row changes as delimited text lines")]
#[command(version)]
pub struct Cli {
    /// Path to deltaflood.toml (used when present if not given)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Environment to load (loads .env.{ENV} instead of .env)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Encoder option as key[=value], applied after file options
    #[arg(short = 'o', long = "option", value_name = "KEY[=VALUE]", global = true)]
    pub options: Vec<PluginOption>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream changes from a replication slot
    Stream {
        /// Replication slot name (overrides [stream] slot)
        #[arg(long)]
        slot: Option<String>,

        /// Publication name (overrides [stream] publication)
        #[arg(long)]
        publication: Option<String>,

        /// Create the replication slot if it doesn't exist
        #[arg(long)]
        create_slot: bool,

        /// Write lines to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render change events from a JSON-lines file ("-" for stdin)
    Render {
        input: PathBuf,

        /// Write lines to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate options and print the effective configuration
    Check,
}
