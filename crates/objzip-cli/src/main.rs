//! objzip CLI
//!
//! Submits conversion jobs to an objzip server and diagnoses converter hosts.

mod api;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "objzip")]
#[command(author, version, about = "objzip - convert zipped 3D models through a headless converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a remote archive and save the result
    Submit {
        /// Address of the source zip archive
        #[arg(short, long)]
        uri: String,

        /// Target format (server default when omitted)
        #[arg(short, long)]
        format: Option<String>,

        /// Where to write the converted archive
        #[arg(short, long, default_value = "output.zip")]
        out: PathBuf,

        /// Server base URL
        #[arg(long, env = "OBJZIP_SERVER_URL", default_value = "http://127.0.0.1:8080")]
        server: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 900)]
        timeout: u64,
    },

    /// Check the converter binary, driver script and work root
    Doctor {
        /// Configuration file to check against
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "objzip=debug,objzip_core=debug"
        } else {
            "objzip=info"
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    info!("Starting objzip CLI");

    let result = match cli.command {
        Commands::Submit {
            uri,
            format,
            out,
            server,
            timeout,
        } => {
            commands::submit::execute(commands::submit::SubmitOptions {
                server,
                uri,
                format,
                out,
                timeout: Duration::from_secs(timeout),
            })
            .await
        }
        Commands::Doctor { config } => commands::doctor::execute(config.as_deref()).await,
    };

    if let Err(ref e) = result {
        error!("Command failed: {}", e);
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}
