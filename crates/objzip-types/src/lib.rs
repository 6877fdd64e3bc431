//! objzip Types - Pure wire definitions
//!
//! Request and response shapes exchanged between callers and the conversion
//! server. No runtime dependencies beyond serde.

use serde::{Deserialize, Serialize};

/// File name used for the result archive in the `Content-Disposition` header
pub const RESULT_FILE_NAME: &str = "output.zip";

/// Response header carrying the per-request workspace id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Response header carrying the converter's exit code (absent if killed by a signal)
pub const EXIT_CODE_HEADER: &str = "x-converter-exit-code";

/// Query/body field holding the archive location
pub const INPUT_ZIP_URI_FIELD: &str = "InputZipUri";

/// Query/body field holding the requested output format
pub const OUTPUT_FORMAT_FIELD: &str = "OutputFormat";

/// JSON body form of a conversion request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertPayload {
    #[serde(rename = "InputZipUri", default)]
    pub input_zip_uri: Option<String>,
    #[serde(rename = "OutputFormat", default)]
    pub output_format: Option<String>,
}

impl ConvertPayload {
    pub fn new(input_zip_uri: impl Into<String>, output_format: Option<String>) -> Self {
        Self {
            input_zip_uri: Some(input_zip_uri.into()),
            output_format,
        }
    }
}

/// Stable, machine-readable failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    FetchFailed,
    ExtractionFailed,
    InputNotFound,
    AmbiguousInput,
    ConverterUnavailable,
    LaunchFailed,
    ConversionTimedOut,
    NoOutputProduced,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::FetchFailed => "fetch_failed",
            ErrorCode::ExtractionFailed => "extraction_failed",
            ErrorCode::InputNotFound => "input_not_found",
            ErrorCode::AmbiguousInput => "ambiguous_input",
            ErrorCode::ConverterUnavailable => "converter_unavailable",
            ErrorCode::LaunchFailed => "launch_failed",
            ErrorCode::ConversionTimedOut => "conversion_timed_out",
            ErrorCode::NoOutputProduced => "no_output_produced",
            ErrorCode::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            stdout: None,
            stderr: None,
            exit_code: None,
        }
    }

    /// Human readable rendering, used by the CLI
    pub fn describe(&self) -> String {
        let mut text = format!("{} ({})", self.error, self.code);
        if let Some(code) = self.exit_code {
            text.push_str(&format!("\nConverter exit code: {}", code));
        }
        if let Some(ref out) = self.stdout {
            text.push_str(&format!("\n\nStandard Output: {}", out));
        }
        if let Some(ref err) = self.stderr {
            text.push_str(&format!("\n\nStandard Error: {}", err));
        }
        text
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
