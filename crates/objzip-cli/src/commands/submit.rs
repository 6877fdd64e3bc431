//! Submit command - convert a remote archive through the server

use crate::api::Client;
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use objzip_types::ConvertPayload;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub struct SubmitOptions {
    pub server: String,
    pub uri: String,
    pub format: Option<String>,
    pub out: PathBuf,
    pub timeout: Duration,
}

pub async fn execute(options: SubmitOptions) -> Result<()> {
    let client = Client::new(&options.server, options.timeout)?;
    let payload = ConvertPayload::new(options.uri.clone(), options.format.clone());
    debug!("Submitting {:?} to {}", payload, options.server);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .context("Invalid spinner template")?,
    );
    spinner.set_message(format!(
        "Converting {} to {}",
        options.uri,
        options.format.as_deref().unwrap_or("the server's default format")
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let converted = match client.convert(&payload).await {
        Ok(converted) => converted,
        Err(e) => {
            spinner.abandon_with_message("Conversion failed".red().to_string());
            return Err(e);
        }
    };
    spinner.finish_and_clear();

    tokio::fs::write(&options.out, &converted.archive)
        .await
        .with_context(|| format!("Failed to write {}", options.out.display()))?;

    println!(
        "{} Wrote {} ({} bytes)",
        "✓".green(),
        options.out.display(),
        converted.archive.len()
    );
    if let Some(code) = converted.exit_code.filter(|c| *c != 0) {
        println!(
            "   {} converter exited with code {}; check the archive contents",
            "!".yellow(),
            code
        );
    }

    Ok(())
}
