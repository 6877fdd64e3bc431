//! API client for the objzip server

use anyhow::{Context, Result};
use bytes::Bytes;
use objzip_types::{ConvertPayload, ErrorBody, EXIT_CODE_HEADER};
use reqwest::Client as ReqwestClient;
use std::time::Duration;

pub struct Client {
    http: ReqwestClient,
    base_url: String,
}

/// A successful conversion as seen by the client
pub struct Converted {
    pub archive: Bytes,
    pub exit_code: Option<i32>,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn convert(&self, payload: &ConvertPayload) -> Result<Converted> {
        let url = format!("{}/api/v1/convert", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to send conversion request to {}", url))?;

        let status = response.status();
        let exit_code = response
            .headers()
            .get(EXIT_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.bytes().await.context("Failed to read response body")?;

        if !status.is_success() {
            match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(error) => anyhow::bail!("Conversion failed: {}", error.describe()),
                Err(_) => anyhow::bail!(
                    "Conversion failed with status {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                ),
            }
        }

        Ok(Converted {
            archive: body,
            exit_code,
        })
    }
}
