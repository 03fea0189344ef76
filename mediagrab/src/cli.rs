//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use eyre::Result;

#[derive(Debug, Parser)]
#[command(name = "mgrab")]
#[command(about = "Download media with the best video and audio merged")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download a URL, merging the best video and audio streams
    Dl(crate::dl::Args),

    /// Show title, uploader and duration without downloading
    Info(crate::info::Args),

    /// Report where ffmpeg and ffprobe resolve
    Check(crate::check::Args),
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Dl(args) => crate::dl::execute(args.try_into()?),
        Commands::Info(args) => crate::info::execute(args),
        Commands::Check(args) => crate::check::execute(args),
    }
}
