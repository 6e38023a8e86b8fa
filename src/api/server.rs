use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::analyze_use_case::{analyze, Analysis};
use crate::domain::error::PipelineError;
use crate::domain::prediction::DEFAULT_THRESHOLD;
use crate::domain::traits::TextClassifier;

// ─── Shared State ─────────────────────────────────────────────────────────────
/// The classifier shared by every request. Forward passes take the
/// lock, so concurrent requests are served one at a time. The server
/// never retrains, so whether a model is loaded is fixed at startup
/// and `/health` answers without touching the lock.
#[derive(Clone)]
pub struct AppState {
    classifier: Arc<Mutex<dyn TextClassifier + Send>>,
    model_loaded: bool,
}

impl AppState {
    pub fn new(classifier: impl TextClassifier + Send + 'static) -> Self {
        let model_loaded = classifier.is_fitted();
        Self {
            classifier: Arc::new(Mutex::new(classifier)),
            model_loaded,
        }
    }

    /// Run `f` against the classifier on the blocking thread pool.
    /// Prediction only reads the classifier, so a lock poisoned by a
    /// panicking request is taken over rather than failing every
    /// later one.
    async fn with_classifier<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TextClassifier) -> Result<T, ApiError> + Send + 'static,
    {
        let classifier = Arc::clone(&self.classifier);
        tokio::task::spawn_blocking(move || {
            let guard = classifier.lock().unwrap_or_else(PoisonError::into_inner);
            f(&*guard)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("inference task failed: {e}")))?
    }
}

// ─── Wire Types ───────────────────────────────────────────────────────────────
/// `text` may be one string or a list; list entries may be null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Single(String),
    Batch(Vec<Option<String>>),
}

impl TextInput {
    pub fn into_texts(self) -> Vec<String> {
        match self {
            TextInput::Single(text) => vec![text],
            TextInput::Batch(texts) => texts.into_iter().map(Option::unwrap_or_default).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<TextInput>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

// ─── Errors ───────────────────────────────────────────────────────────────────
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────
async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let texts = request
        .text
        .ok_or_else(|| ApiError::BadRequest("No text provided".to_string()))?
        .into_texts();

    tracing::debug!("Analysing {} texts", texts.len());
    let analysis = state
        .with_classifier(move |classifier| Ok(analyze(classifier, &texts, DEFAULT_THRESHOLD)?))
        .await?;
    Ok(Json(analysis))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.model_loaded,
    })
}

// ─── Server ───────────────────────────────────────────────────────────────────
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server stopped unexpectedly")
}
