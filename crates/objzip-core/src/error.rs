//! Error types for the conversion pipeline

use crate::invoke::ConversionOutcome;
use objzip_types::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to fetch input archive: {0}")]
    FetchFailed(String),

    #[error("Failed to extract input archive: {0}")]
    ExtractionFailed(String),

    #[error("No .{extension} file found at the top level of the archive")]
    InputNotFound { extension: String },

    #[error("Expected exactly one .{extension} file, found {}: {}", candidates.len(), candidates.join(", "))]
    AmbiguousInput {
        extension: String,
        candidates: Vec<String>,
    },

    #[error("Converter unavailable: {0}")]
    ConverterUnavailable(String),

    #[error("Failed to launch converter: {0}")]
    LaunchFailed(String),

    #[error("Converter did not finish within {secs}s")]
    ConversionTimedOut { secs: u64 },

    #[error("Converter produced no output in '{dir}'")]
    NoOutputProduced {
        dir: String,
        outcome: ConversionOutcome,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Wire code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            ConvertError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ConvertError::FetchFailed(_) => ErrorCode::FetchFailed,
            ConvertError::ExtractionFailed(_) => ErrorCode::ExtractionFailed,
            ConvertError::InputNotFound { .. } => ErrorCode::InputNotFound,
            ConvertError::AmbiguousInput { .. } => ErrorCode::AmbiguousInput,
            ConvertError::ConverterUnavailable(_) => ErrorCode::ConverterUnavailable,
            ConvertError::LaunchFailed(_) => ErrorCode::LaunchFailed,
            ConvertError::ConversionTimedOut { .. } => ErrorCode::ConversionTimedOut,
            ConvertError::NoOutputProduced { .. } => ErrorCode::NoOutputProduced,
            ConvertError::Io(_) => ErrorCode::Internal,
        }
    }

    /// Captured converter output, when the converter got to run
    pub fn outcome(&self) -> Option<&ConversionOutcome> {
        match self {
            ConvertError::NoOutputProduced { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(e: zip::result::ZipError) -> Self {
        ConvertError::ExtractionFailed(e.to_string())
    }
}

impl From<reqwest::Error> for ConvertError {
    fn from(e: reqwest::Error) -> Self {
        let cause = if e.is_timeout() {
            "request timed out".to_string()
        } else if let Some(status) = e.status() {
            format!("remote returned {}", status)
        } else {
            e.to_string()
        };
        ConvertError::FetchFailed(cause)
    }
}
