//! HTTP surface: JSON and multipart routes over a shared [`Analyzer`].
//!
//! Routes:
//!
//! | Method | Path                | Body                   | Response                    |
//! |--------|---------------------|------------------------|-----------------------------|
//! | POST   | `/api/scrape`       | `{"url": ...}`         | `ScrapeOutput`              |
//! | POST   | `/api/analyze/text` | `{"text": ...}`        | `{"response", "status"}`    |
//! | POST   | `/api/analyze/pdf`  | multipart field `file` | `AnalysisResult`            |
//! | GET    | `/health`           |                        | `{"status": "ok", version}` |
//!
//! Only requests that carry no usable input are answered with 400. A failed
//! extraction or completion is a normal 200 response with the failure
//! described in the body.

use crate::analyze::{Analyzer, DocumentUpload};
use crate::config::AnalysisConfig;
use crate::error::{BadRequestError, DocsiftError};
use crate::output::AnalysisStatus;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextResponse {
    pub response: String,
    pub status: AnalysisStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/scrape", post(scrape_handler))
        .route("/api/analyze/text", post(analyze_text_handler))
        .route("/api/analyze/pdf", post(analyze_pdf_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(trace_layer)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(
    addr: SocketAddr,
    analyzer: Analyzer,
    config: &AnalysisConfig,
) -> Result<(), DocsiftError> {
    let state = AppState {
        analyzer: Arc::new(analyzer),
    };
    let app = create_router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| DocsiftError::Bind { addr, source })?;
    let local = listener
        .local_addr()
        .map_err(|e| DocsiftError::Server(e.to_string()))?;
    info!(addr = %local, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .map_err(|e| DocsiftError::Server(e.to_string()))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn scrape_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    Json(state.analyzer.scrape(&req.url).await).into_response()
}

async fn analyze_text_handler(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };

    match state.analyzer.analyze_text(&req.text).await {
        Ok(result) => Json(TextResponse {
            response: result.response_text().to_string(),
            status: result.status,
        })
        .into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn analyze_pdf_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read multipart");
                return error_response(e.status(), format!("Failed to read upload: {e}"));
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to read file bytes");
                return error_response(e.status(), format!("Failed to read upload: {e}"));
            }
        };

        upload = Some(DocumentUpload {
            bytes: bytes.to_vec(),
            filename,
            content_type,
        });
        break;
    }

    let Some(upload) = upload.filter(|u| !u.bytes.is_empty()) else {
        warn!("Document request without a file");
        return bad_request(BadRequestError::MissingUpload.to_string());
    };

    Json(state.analyzer.analyze_document(upload).await).into_response()
}

fn bad_json(rejection: JsonRejection) -> Response {
    warn!(error = %rejection, "Rejected request body");
    bad_request(rejection.body_text())
}

fn bad_request(error: String) -> Response {
    error_response(StatusCode::BAD_REQUEST, error)
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
