//! Server configuration

use anyhow::{Context, Result};
use objzip_core::config::load_settings;
use objzip_core::PipelineConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerSettings,
    pub pipeline: PipelineConfig,
}

/// Load both sections from the same layered sources
pub async fn load_config(file: Option<&Path>) -> Result<Config> {
    info!("Loading configuration...");

    let settings = load_settings(file).context("Failed to read configuration sources")?;
    let server: ServerSettings = settings
        .clone()
        .try_deserialize()
        .context("Invalid server configuration")?;
    let pipeline: PipelineConfig = settings
        .try_deserialize()
        .context("Invalid pipeline configuration")?;

    // Ensure the work root exists and is usable before taking traffic
    tokio::fs::create_dir_all(&pipeline.work_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create work root {}",
                pipeline.work_root.display()
            )
        })?;
    info!("Work root: {}", pipeline.work_root.display());

    Ok(Config { server, pipeline })
}
