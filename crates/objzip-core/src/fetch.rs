//! Remote archive retrieval

use crate::config::PipelineConfig;
use crate::error::{ConvertError, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client as ReqwestClient, Url};
use tracing::debug;

/// Retrieves the bytes of a source archive.
///
/// Implementations must not retry: a single failure is reported as
/// [`ConvertError::FetchFailed`].
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, location: &Url) -> Result<Bytes>;
}

/// HTTP(S) fetcher backed by reqwest
pub struct HttpFetcher {
    http: ReqwestClient,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(config.fetch_timeout())
            .user_agent(concat!("objzip/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConvertError::FetchFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            max_bytes: config.max_archive_bytes,
        })
    }

    fn too_large(&self) -> ConvertError {
        ConvertError::FetchFailed(format!(
            "archive exceeds the {} byte limit",
            self.max_bytes
        ))
    }
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, location: &Url) -> Result<Bytes> {
        debug!("Fetching archive from {}", location);

        let mut response = self
            .http
            .get(location.clone())
            .send()
            .await?
            .error_for_status()?;

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(self.too_large());
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if (buf.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large());
            }
            buf.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes", buf.len());
        Ok(buf.freeze())
    }
}
