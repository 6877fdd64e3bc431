//! Pipeline failures as HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use objzip_core::ConvertError;
use objzip_types::{ErrorBody, ErrorCode};

/// Conversion error response
pub struct ApiError(pub ConvertError);

impl From<ConvertError> for ApiError {
    fn from(e: ConvertError) -> Self {
        ApiError(e)
    }
}

/// HTTP status for each failure kind
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::FetchFailed => StatusCode::BAD_GATEWAY,
        ErrorCode::ExtractionFailed | ErrorCode::InputNotFound | ErrorCode::AmbiguousInput => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorCode::ConverterUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::ConversionTimedOut => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::LaunchFailed | ErrorCode::NoOutputProduced | ErrorCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = status_for(code);

        let message = match code {
            // Local IO failures can mention host paths
            ErrorCode::Internal => "Internal error while processing the conversion".to_string(),
            _ => self.0.to_string(),
        };
        if status.is_server_error() {
            tracing::error!("Conversion request failed: {}", self.0);
        } else {
            tracing::warn!("Conversion request rejected: {}", self.0);
        }

        let mut body = ErrorBody::new(code, message);
        if let Some(outcome) = self.0.outcome() {
            body.stdout = Some(outcome.stdout.clone());
            body.stderr = Some(outcome.stderr.clone());
            body.exit_code = outcome.exit_code;
        }

        (status, Json(body)).into_response()
    }
}
