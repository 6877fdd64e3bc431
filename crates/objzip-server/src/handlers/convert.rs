//! Conversion handler

use crate::error::ApiError;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use objzip_core::{ConversionResult, RequestSource};
use objzip_types::{EXIT_CODE_HEADER, REQUEST_ID_HEADER, RESULT_FILE_NAME};
use std::collections::HashMap;
use tracing::info;

/// Accepts either `?InputZipUri=...&OutputFormat=...` or a JSON body
pub async fn convert(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = state
        .pipeline
        .resolve(RequestSource::from_parts(params, body))?;
    info!(
        "Conversion requested: {} -> {}",
        request.source_archive(),
        request.output_format()
    );

    let result = state.pipeline.run(&request).await?;
    Ok(archive_response(result))
}

fn archive_response(result: ConversionResult) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    if let Ok(value) =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", RESULT_FILE_NAME))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&result.request_id.to_string()) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    if let Some(code) = result.outcome.exit_code {
        headers.insert(HeaderName::from_static(EXIT_CODE_HEADER), HeaderValue::from(code));
    }

    (headers, Body::from(result.archive)).into_response()
}

#[cfg(test)]
mod tests {
    use crate::{build_router, AppState};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use bytes::Bytes;
    use objzip_core::{
        ArchiveFetcher, ConversionOutcome, ConvertError, Converter, Pipeline, PipelineConfig,
        StagedInput, Url,
    };
    use objzip_types::{ErrorBody, ErrorCode, EXIT_CODE_HEADER};
    use std::io::{Cursor, Read, Write};
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    const MODEL_URL: &str = "https://assets.example/chair.zip";

    struct StaticFetcher {
        archive: Bytes,
    }

    #[async_trait]
    impl ArchiveFetcher for StaticFetcher {
        async fn fetch(&self, location: &Url) -> objzip_core::Result<Bytes> {
            if location.as_str() == MODEL_URL {
                Ok(self.archive.clone())
            } else {
                Err(ConvertError::FetchFailed("remote returned 404 Not Found".to_string()))
            }
        }
    }

    /// Writes `converted/<stem>.<format>` unless asked to write nothing
    struct StubConverter {
        writes_output: bool,
        exit_code: i32,
    }

    #[async_trait]
    impl Converter for StubConverter {
        async fn convert(
            &self,
            input: &StagedInput,
            output_format: &str,
            workdir: &Path,
        ) -> objzip_core::Result<ConversionOutcome> {
            if self.writes_output {
                let out = workdir.join("converted");
                std::fs::create_dir_all(&out)?;
                let stem = input.file_path().file_stem().unwrap().to_string_lossy();
                std::fs::write(out.join(format!("{}.{}", stem, output_format)), b"converted")?;
            }
            Ok(ConversionOutcome {
                stdout: "batch job finished, exiting\n".to_string(),
                stderr: if self.writes_output {
                    String::new()
                } else {
                    "Error: --outputFormat argument invalid\n".to_string()
                },
                exit_code: Some(self.exit_code),
            })
        }
    }

    fn model_zip(names: &[&str]) -> Bytes {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            writer
                .start_file(name.to_string(), zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"v 0 0 0").unwrap();
        }
        Bytes::from(writer.finish().unwrap().into_inner())
    }

    fn app(root: &Path, archive: Bytes, converter: StubConverter) -> Router {
        let config = PipelineConfig {
            work_root: root.join("objzip"),
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(
            config,
            Arc::new(StaticFetcher { archive }),
            Arc::new(converter),
        );
        build_router(AppState {
            pipeline: Arc::new(pipeline),
        })
    }

    fn ok_converter() -> StubConverter {
        StubConverter {
            writes_output: true,
            exit_code: 0,
        }
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/convert")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn error_body(response: axum::response::Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_returns_zip() {
        let root = tempfile::TempDir::new().unwrap();
        let app = app(root.path(), model_zip(&["chair.obj"]), ok_converter());

        let response = app
            .oneshot(json_request(
                r#"{"InputZipUri": "https://assets.example/chair.zip", "OutputFormat": "gltf"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/zip"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"output.zip\""
        );
        assert_eq!(response.headers()[EXIT_CODE_HEADER], "0");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut content = String::new();
        archive
            .by_name("chair.gltf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "converted");
        assert_eq!(std::fs::read_dir(root.path().join("objzip")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_query_form_is_accepted() {
        let root = tempfile::TempDir::new().unwrap();
        let app = app(root.path(), model_zip(&["chair.obj"]), ok_converter());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/convert?InputZipUri=https%3A%2F%2Fassets.example%2Fchair.zip&OutputFormat=obj")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_legacy_route_is_accepted() {
        let root = tempfile::TempDir::new().unwrap();
        let app = app(root.path(), model_zip(&["chair.obj"]), ok_converter());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/RunBlenderScripts")
            .body(Body::from(r#"{"InputZipUri": "https://assets.example/chair.zip"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_uri_is_bad_request() {
        let root = tempfile::TempDir::new().unwrap();
        let app = app(root.path(), model_zip(&["chair.obj"]), ok_converter());

        let response = app
            .oneshot(json_request(r#"{"OutputFormat": "gltf"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_unreachable_archive_is_bad_gateway() {
        let root = tempfile::TempDir::new().unwrap();
        let app = app(root.path(), model_zip(&["chair.obj"]), ok_converter());

        let response = app
            .oneshot(json_request(
                r#"{"InputZipUri": "https://assets.example/missing.zip"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error_body(response).await.code, ErrorCode::FetchFailed);
    }

    #[tokio::test]
    async fn test_ambiguous_archive_is_unprocessable() {
        let root = tempfile::TempDir::new().unwrap();
        let app = app(root.path(), model_zip(&["a.obj", "b.obj"]), ok_converter());

        let response = app
            .oneshot(json_request(
                r#"{"InputZipUri": "https://assets.example/chair.zip"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = error_body(response).await;
        assert_eq!(body.code, ErrorCode::AmbiguousInput);
        assert!(body.error.contains("a.obj"));
        assert!(!body.error.contains(&root.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_no_output_reports_converter_streams() {
        let root = tempfile::TempDir::new().unwrap();
        let converter = StubConverter {
            writes_output: false,
            exit_code: 0,
        };
        let app = app(root.path(), model_zip(&["chair.obj"]), converter);

        let response = app
            .oneshot(json_request(
                r#"{"InputZipUri": "https://assets.example/chair.zip", "OutputFormat": "fbx"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = error_body(response).await;
        assert_eq!(body.code, ErrorCode::NoOutputProduced);
        assert_eq!(body.exit_code, Some(0));
        assert!(body.stderr.unwrap().contains("outputFormat"));
        assert_eq!(std::fs::read_dir(root.path().join("objzip")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_zero_exit_with_output_is_ok() {
        let root = tempfile::TempDir::new().unwrap();
        let converter = StubConverter {
            writes_output: true,
            exit_code: 2,
        };
        let app = app(root.path(), model_zip(&["chair.obj"]), converter);

        let response = app
            .oneshot(json_request(
                r#"{"InputZipUri": "https://assets.example/chair.zip"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[EXIT_CODE_HEADER], "2");
    }

    #[tokio::test]
    async fn test_health() {
        let root = tempfile::TempDir::new().unwrap();
        let app = app(root.path(), Bytes::new(), ok_converter());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: objzip_types::HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health.status, "ok");
    }
}
