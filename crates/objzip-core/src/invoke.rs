//! External converter invocation
//!
//! The converter is launched as
//! `<binary> -b -P <driver_script> -- -i <input> -o <format>` with a discrete
//! argument vector; nothing passes through a shell.

use crate::config::{absolute_path, PipelineConfig};
use crate::error::{ConvertError, Result};
use crate::locate::StagedInput;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Everything the converter told us
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ConversionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a conversion of a staged input inside a workspace.
///
/// A non-zero exit is not an error: it is reported in the outcome and the
/// caller decides based on what was written to disk.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(
        &self,
        input: &StagedInput,
        output_format: &str,
        workdir: &Path,
    ) -> Result<ConversionOutcome>;
}

/// Converter backed by an external process
#[derive(Debug, Clone)]
pub struct ProcessConverter {
    binary: PathBuf,
    driver_script: PathBuf,
    timeout: Duration,
}

impl ProcessConverter {
    /// Relative paths are pinned to the current directory here, since the
    /// child runs inside the workspace
    pub fn new(binary: impl Into<PathBuf>, driver_script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: absolute_path(binary),
            driver_script: absolute_path(driver_script),
            timeout,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            &config.converter_binary,
            &config.driver_script,
            config.convert_timeout(),
        )
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn driver_script(&self) -> &Path {
        &self.driver_script
    }

    /// Argument vector passed to the converter binary
    pub fn args(&self, input: &Path, output_format: &str) -> Vec<OsString> {
        vec![
            "-b".into(),
            "-P".into(),
            self.driver_script.clone().into_os_string(),
            "--".into(),
            "-i".into(),
            input.as_os_str().to_os_string(),
            "-o".into(),
            output_format.into(),
        ]
    }

    /// Check the deployment before launching anything
    pub async fn check_available(&self) -> Result<()> {
        if !is_file(&self.binary).await {
            warn!("Converter binary not found at {}", self.binary.display());
            return Err(ConvertError::ConverterUnavailable(
                "converter binary is not installed".to_string(),
            ));
        }
        if !is_file(&self.driver_script).await {
            warn!("Driver script not found at {}", self.driver_script.display());
            return Err(ConvertError::ConverterUnavailable(
                "conversion driver script is not installed".to_string(),
            ));
        }
        Ok(())
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl Converter for ProcessConverter {
    async fn convert(
        &self,
        input: &StagedInput,
        output_format: &str,
        workdir: &Path,
    ) -> Result<ConversionOutcome> {
        self.check_available().await?;

        let args = self.args(input.file_path(), output_format);
        debug!("Launching converter: {} {:?}", self.binary.display(), args);

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| ConvertError::LaunchFailed(e.to_string()))?;
        let pid = child.id();
        let started = Instant::now();

        // Dropping the wait future drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    "Converter (pid {:?}) exceeded {}s, killing it",
                    pid,
                    self.timeout.as_secs()
                );
                return Err(ConvertError::ConversionTimedOut {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let outcome = ConversionOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        info!(
            "Converter finished in {}ms with exit code {:?}",
            started.elapsed().as_millis(),
            outcome.exit_code
        );
        if !outcome.success() {
            warn!("Converter exited unsuccessfully: {}", outcome.stderr.trim());
        }

        Ok(outcome)
    }
}
