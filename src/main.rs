// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use snapfeed::constants::app_info;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "snapfeed")]
#[command(about = "Camera capture for the snapfeed photo feed")]
#[command(version = app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List bundled video sources
    Sources,

    /// Take a photo through a full capture session
    Photo {
        /// Video source: `synthetic` or the path of an image to use as the feed
        #[arg(short, long, default_value = "synthetic")]
        source: String,

        /// Output directory (default: photo_dir from config, or ~/Pictures/snapfeed)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Discard and retake the photo this many times before keeping it
        #[arg(short, long, default_value = "0")]
        retakes: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=snapfeed=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sources => cli::list_sources(),
        Commands::Photo {
            source,
            output,
            retakes,
        } => cli::take_photo(&source, output, retakes),
    }
}
