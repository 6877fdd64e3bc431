//! Request resolution
//!
//! Normalizes the two inbound shapes (query parameters or a JSON body) into a
//! [`ConversionRequest`].

use crate::config::PipelineConfig;
use crate::error::{ConvertError, Result};
use bytes::Bytes;
use objzip_types::{ConvertPayload, INPUT_ZIP_URI_FIELD, OUTPUT_FORMAT_FIELD};
use reqwest::Url;
use std::collections::HashMap;

/// Raw inbound request data
#[derive(Debug, Clone)]
pub enum RequestSource {
    /// Structured body (`{"InputZipUri": ..., "OutputFormat": ...}`)
    Body(Bytes),
    /// Query-style key/value parameters
    Query(HashMap<String, String>),
}

impl RequestSource {
    /// Pick the shape actually used: a non-empty body wins over the query
    pub fn from_parts(query: HashMap<String, String>, body: Bytes) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            RequestSource::Query(query)
        } else {
            RequestSource::Body(body)
        }
    }
}

/// Canonical, immutable conversion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    source_archive: Url,
    output_format: String,
}

impl ConversionRequest {
    pub fn new(source_archive: Url, output_format: impl Into<String>) -> Self {
        Self {
            source_archive,
            output_format: output_format.into(),
        }
    }

    pub fn source_archive(&self) -> &Url {
        &self.source_archive
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }
}

/// Resolve an inbound request into a [`ConversionRequest`]
pub fn resolve(source: RequestSource, config: &PipelineConfig) -> Result<ConversionRequest> {
    let payload = match source {
        RequestSource::Body(body) => serde_json::from_slice::<ConvertPayload>(&body)
            .map_err(|e| ConvertError::InvalidRequest(format!("Unparseable request body: {}", e)))?,
        RequestSource::Query(mut params) => ConvertPayload {
            input_zip_uri: params.remove(INPUT_ZIP_URI_FIELD),
            output_format: params.remove(OUTPUT_FORMAT_FIELD),
        },
    };

    let raw_uri = payload
        .input_zip_uri
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConvertError::InvalidRequest(format!("{} is required", INPUT_ZIP_URI_FIELD)))?;

    let source_archive = Url::parse(raw_uri).map_err(|e| {
        ConvertError::InvalidRequest(format!("{} is not a valid URL: {}", INPUT_ZIP_URI_FIELD, e))
    })?;
    if !matches!(source_archive.scheme(), "http" | "https") {
        return Err(ConvertError::InvalidRequest(format!(
            "{} must use http or https, got '{}'",
            INPUT_ZIP_URI_FIELD,
            source_archive.scheme()
        )));
    }

    let output_format = payload
        .output_format
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(config.default_output_format.as_str())
        .to_string();

    if !config.allowed_formats.is_empty()
        && !config
            .allowed_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&output_format))
    {
        return Err(ConvertError::InvalidRequest(format!(
            "Unsupported {} '{}' (supported: {})",
            OUTPUT_FORMAT_FIELD,
            output_format,
            config.allowed_formats.join(", ")
        )));
    }

    Ok(ConversionRequest::new(source_archive, output_format))
}
