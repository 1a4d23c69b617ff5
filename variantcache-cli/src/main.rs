//! variantcache CLI - command-line interface
//!
//! Serves, flushes and lists image variants using the configured origin
//! and store.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use error::CliError;

#[derive(Parser)]
#[command(name = "variantcache")]
#[command(version, about = "Resized image cache backed by a blob store", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.variantcache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a variant of an image, filling the cache on a miss
    Get {
        /// Variant name (e.g. thumbnail, original)
        variant: String,

        /// Image filename relative to the origin root
        filename: String,

        /// Write the image here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove cached variants of an image
    ///
    /// Flushing the canonical variant removes every variant of the file.
    Flush {
        variant: String,
        filename: String,
    },

    /// List the configured variants
    Variants,

    /// Write a configuration file with default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Get {
            variant,
            filename,
            output,
        } => commands::get::run(cli.config, cli.verbose, &variant, &filename, output).await,
        Commands::Flush { variant, filename } => {
            commands::flush::run(cli.config, cli.verbose, &variant, &filename).await
        }
        Commands::Variants => commands::variants::run(cli.config),
        Commands::InitConfig { force } => commands::init::run(cli.config, force),
    };

    if let Err(e) = result {
        e.exit();
    }
}
