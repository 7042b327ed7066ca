// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::{
    multipart::{MultipartError, MultipartRejection},
    Multipart,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::{
    handlers::missing_field, ApiError, AskForm, AskResponse, HealthResponse, ResetResponse,
    StatusResponse, UploadResponse,
};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::rag::{DocumentProcessor, SessionState};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionState>,
    pub processor: Arc<DocumentProcessor>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(processor: DocumentProcessor) -> Self {
        Self {
            session: Arc::new(SessionState::new()),
            processor: Arc::new(processor),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        // Landing page
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/status/", get(status_handler))
        .route("/upload_pdf/", post(upload_pdf_handler))
        .route("/ask/", post(ask_handler))
        .route("/reset/", delete(reset_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        embeddings_loaded: state.processor.embeddings_loaded(),
        document_processed: state.session.is_ready().await,
    })
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let current_document = state.session.current_document().await;
    Json(StatusResponse {
        system_ready: current_document.is_some(),
        embeddings_loaded: state.processor.embeddings_loaded(),
        current_document,
        groq_api_configured: state.processor.llm_configured(),
    })
}

async fn upload_pdf_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let limit = state.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_stream_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_stream_error(e, limit))?;
        if bytes.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }

        let ready = state.processor.process(&filename, bytes.to_vec()).await?;
        let document_info = ready.document.clone();
        state.session.install(ready).await;

        return Ok(Json(UploadResponse {
            message: format!("PDF '{}' uploaded and processed successfully", filename),
            document_info,
        }));
    }

    Err(missing_field("file"))
}

/// Body-limit hits inside the multipart stream surface as 413
fn upload_stream_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::InvalidRequest(err.body_text())
    }
}

async fn ask_handler(
    State(state): State<AppState>,
    form: AskForm,
) -> Result<Json<AskResponse>, ApiError> {
    let (result, document_info) = state.session.ask(&form.question).await?;

    info!(
        "Question answered successfully (sources: {})",
        result.sources.len()
    );

    Ok(Json(AskResponse::new(result, document_info)))
}

async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.session.reset().await;
    info!("System reset successfully");

    Json(ResetResponse {
        message: "System reset successfully. You can now upload a new PDF.".to_string(),
    })
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>PDF Question Answering</title>
</head>
<body>
  <h1>PDF Question Answering</h1>
  <p>Upload one PDF, then ask questions answered from its content.</p>
  <ul>
    <li><code>POST /upload_pdf/</code> multipart field <code>file</code></li>
    <li><code>POST /ask/</code> form field <code>question</code></li>
    <li><code>GET /status/</code> current document and configuration</li>
    <li><code>GET /health</code> liveness</li>
    <li><code>DELETE /reset/</code> discard the current document</li>
  </ul>
  <form action="/upload_pdf/" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".pdf">
    <button type="submit">Upload</button>
  </form>
  <form action="/ask/" method="post">
    <input type="text" name="question" placeholder="Ask a question">
    <button type="submit">Ask</button>
  </form>
</body>
</html>
"#;
