//! Streamframe CLI - DRM and license exchange toolkit
//!
//! Features:
//! - Platform detection from a user agent
//! - DRM engine configuration preview
//! - FairPlay SPC/CKC encoding and decoding
//! - Live FairPlay license exchange
//! - Player configuration validation

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// Streamframe CLI - Embedded player DRM toolkit
#[derive(Parser)]
#[command(name = "streamframe")]
#[command(version)]
#[command(about = "DRM profile and license exchange toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the platform and key system for a user agent
    Detect {
        /// Browser user agent string
        user_agent: String,
    },

    /// Print the engine DRM configuration for a platform
    Profile {
        /// Platform (apple-webkit, other)
        #[arg(short, long, default_value = "other")]
        platform: String,

        /// Content key id
        #[arg(short, long)]
        key_id: String,

        /// Player configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// FairPlay server certificate (DER)
        #[arg(long)]
        certificate: Option<PathBuf>,
    },

    /// Encode a raw SPC into a license request body
    Spc {
        /// SPC file produced by the CDM
        input: PathBuf,
    },

    /// Decode a CKC license response body
    Ckc {
        /// Response body as returned by the license server
        input: PathBuf,

        /// Write the decoded CKC to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Send an SPC to the license server and decode the CKC
    Exchange {
        /// Content key id
        #[arg(short, long)]
        key_id: String,

        /// SPC file produced by the CDM
        #[arg(short, long)]
        spc: PathBuf,

        /// Player configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the decoded CKC to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the media events forwarded to the host
    Events {
        /// Additional event names
        #[arg(short, long, value_delimiter = ',')]
        extra: Vec<String>,
    },

    /// Validate a player configuration file
    ValidateConfig {
        /// Configuration file (JSON)
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Detect { user_agent } => {
            commands::detect(&user_agent, &cli.format)?;
        }
        Commands::Profile { platform, key_id, config, certificate } => {
            commands::profile(&platform, &key_id, config, certificate, &cli.format)?;
        }
        Commands::Spc { input } => {
            commands::spc(&input, &cli.format)?;
        }
        Commands::Ckc { input, output } => {
            commands::ckc(&input, output, &cli.format)?;
        }
        Commands::Exchange { key_id, spc, config, output } => {
            commands::exchange(&key_id, &spc, config, output, &cli.format).await?;
        }
        Commands::Events { extra } => {
            commands::events(&extra, &cli.format)?;
        }
        Commands::ValidateConfig { config } => {
            commands::validate_config(&config, &cli.format)?;
        }
    }

    Ok(())
}
