//! HTTP surface.
//!
//! GET /        - banner
//! GET /health  - liveness plus corpus size
//! GET /ask     - `?query=<text>`, answers with the `AnswerResult` JSON

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use healthdialog_core::config::ServerConfig;
use healthdialog_rag::ResponseAssembler;

#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<ResponseAssembler>,
}

impl AppState {
    pub fn new(assembler: ResponseAssembler) -> Self { Self { assembler: Arc::new(assembler) } }
}

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub query: String,
}

pub async fn root() -> impl IntoResponse { Json(json!({ "message": "HealthDialog API is running!" })) }

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "faq_count": state.assembler.corpus().len() }))
}

/// A missing `query` parameter is rejected by the extractor with 400.
pub async fn ask(State(state): State<AppState>, Query(params): Query<AskParams>) -> Response {
    let query = params.query.trim();
    if query.is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "query must not be empty" }))).into_response();
    }
    Json(state.assembler.answer(query).await).into_response()
}

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ask", get(ask))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}
