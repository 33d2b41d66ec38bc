//! HTTP boundary: multipart decoding, routing, and error-to-status mapping.

use crate::ai::mime::declared_or_default;
use crate::app::{App, ModelCheckReport};
use crate::fallback::FailureKind;
use crate::models::ImageUpload;
use crate::Result;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Multipart field carrying the uploaded photo.
pub const IMAGE_FIELD: &str = "image";

const NO_IMAGE_MESSAGE: &str = "이미지가 제공되지 않았습니다.";
const IMAGE_TOO_LARGE_MESSAGE: &str = "이미지 파일이 너무 큽니다.";

/// JSON `{"error": message}` response with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<FailureKind> for ApiError {
    fn from(kind: FailureKind) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: kind.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        tracing::warn!("Failed to read multipart body: {}", err);
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: IMAGE_TOO_LARGE_MESSAGE.to_string(),
            },
            _ => Self::bad_request(NO_IMAGE_MESSAGE),
        }
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Reads the `image` field; a missing or empty upload is a `400`.
async fn read_image(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<ImageUpload, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::warn!("Request is not multipart: {}", rejection.body_text());
        ApiError::bad_request(NO_IMAGE_MESSAGE)
    })?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let mime_type = declared_or_default(field.content_type());
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            break;
        }
        tracing::debug!("Received {} byte {} upload", bytes.len(), mime_type);
        return Ok(ImageUpload {
            bytes: bytes.to_vec(),
            mime_type,
        });
    }
    Err(ApiError::bad_request(NO_IMAGE_MESSAGE))
}

fn request_span(route: &'static str) -> tracing::Span {
    info_span!("request", id = %Uuid::new_v4(), route)
}

async fn analyze_handler(
    State(app): State<Arc<App>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    async move {
        let upload = read_image(multipart).await?;
        let text = app.analyze(upload).await?;
        info!("Analysis complete ({} chars)", text.len());
        Ok::<_, ApiError>(Json(json!({ "result": text })))
    }
    .instrument(request_span("analyze"))
    .await
}

async fn automate_handler(
    State(app): State<Arc<App>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    async move {
        let upload = read_image(multipart).await?;
        let comparison = app.automate(upload).await?;
        info!("Comparison complete");
        Ok::<_, ApiError>(Json(comparison))
    }
    .instrument(request_span("automate"))
    .await
}

async fn check_models_handler(State(app): State<Arc<App>>) -> ApiResult<ModelCheckReport> {
    async move { Ok::<_, ApiError>(Json(app.check_models().await?)) }
        .instrument(request_span("check-models"))
        .await
}

pub fn router(app: Arc<App>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/automate", post(automate_handler))
        .route("/api/check-models", get(check_models_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app)
}

/// Serves `router` on an already-bound listener until the process stops.
pub async fn serve(listener: tokio::net::TcpListener, router: Router) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds_map_to_server_error() {
        let err = ApiError::from(FailureKind::QuotaExceeded);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.message,
            "API 사용량 한도를 초과했습니다. 잠시 후 다시 시도해주세요."
        );
    }

    #[test]
    fn test_bad_request() {
        let err = ApiError::bad_request(NO_IMAGE_MESSAGE);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
