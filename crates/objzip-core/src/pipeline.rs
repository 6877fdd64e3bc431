//! Conversion pipeline
//!
//! Resolver -> Fetcher -> Workspace (open) -> Extractor -> Locator ->
//! Converter -> Output Collector -> Workspace (close). Nothing is shared
//! between runs except the work root under which workspaces are allocated.

use crate::collect::collect_output;
use crate::config::PipelineConfig;
use crate::error::{ConvertError, Result};
use crate::extract::extract_archive;
use crate::fetch::{ArchiveFetcher, HttpFetcher};
use crate::invoke::{ConversionOutcome, Converter, ProcessConverter};
use crate::locate::locate_input;
use crate::request::{resolve, ConversionRequest, RequestSource};
use crate::workspace::{Workspace, WorkspaceManager};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// A packaged conversion
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Id of the workspace the conversion ran in
    pub request_id: Uuid,
    /// Zip of the converter's output directory
    pub archive: Bytes,
    pub outcome: ConversionOutcome,
}

pub struct Pipeline {
    config: PipelineConfig,
    workspaces: WorkspaceManager,
    fetcher: Arc<dyn ArchiveFetcher>,
    converter: Arc<dyn Converter>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn ArchiveFetcher>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        Self {
            workspaces: WorkspaceManager::new(&config.work_root),
            config,
            fetcher,
            converter,
        }
    }

    /// Production wiring: HTTP fetcher and the external converter process
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let converter = Arc::new(ProcessConverter::from_config(&config));
        Ok(Self::new(config, fetcher, converter))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn resolve(&self, source: RequestSource) -> Result<ConversionRequest> {
        resolve(source, &self.config)
    }

    /// Run one conversion end to end.
    ///
    /// The workspace is removed before this returns, and also if the returned
    /// future is dropped before completion.
    pub async fn run(&self, request: &ConversionRequest) -> Result<ConversionResult> {
        let started = Instant::now();
        let archive = self.fetcher.fetch(request.source_archive()).await?;

        let workspace = Arc::new(self.workspaces.open().await?);
        let span = info_span!("conversion", request_id = %workspace.id());

        async move {
            info!(
                "Converting {} bytes to '{}'",
                archive.len(),
                request.output_format()
            );

            let result = self.convert_in(&workspace, archive, request).await;

            if let Err(e) = workspace.close().await {
                warn!("Failed to clean up workspace: {}", e);
            }

            match &result {
                Ok(converted) => info!(
                    "Conversion finished in {}ms ({} bytes)",
                    started.elapsed().as_millis(),
                    converted.archive.len()
                ),
                Err(e) => warn!("Conversion failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn convert_in(
        &self,
        workspace: &Arc<Workspace>,
        archive: Bytes,
        request: &ConversionRequest,
    ) -> Result<ConversionResult> {
        let ws = Arc::clone(workspace);
        let limit = self.config.max_extracted_bytes;
        let extracted =
            tokio::task::spawn_blocking(move || extract_archive(&archive, ws.path(), limit))
                .await
                .map_err(join_failure)??;
        debug!("Extracted {} files", extracted);

        let input = locate_input(workspace.path(), &self.config.input_extension).await?;
        info!("Staged input {}", input.file_name());

        let outcome = self
            .converter
            .convert(&input, request.output_format(), workspace.path())
            .await?;

        let output_dir = workspace.path().join(&self.config.output_dir_name);
        let packed = tokio::task::spawn_blocking(move || collect_output(&output_dir))
            .await
            .map_err(join_failure)??;

        match packed {
            Some(bytes) => Ok(ConversionResult {
                request_id: workspace.id(),
                archive: Bytes::from(bytes),
                outcome,
            }),
            None => Err(ConvertError::NoOutputProduced {
                dir: self.config.output_dir_name.clone(),
                outcome,
            }),
        }
    }
}

fn join_failure(e: tokio::task::JoinError) -> ConvertError {
    ConvertError::Io(std::io::Error::other(e))
}
