use std::{any::Any, sync::Arc};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

use crate::{
    error::ApiError,
    relay::PromptRelay,
    types::{PromptRequest, PromptResult},
};

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<PromptRelay>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn generate(
    State(state): State<AppState>,
    request: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<PromptResult>, ApiError> {
    let Json(request) = request.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "rejected /generate body");
        ApiError::InvalidJson
    })?;

    let prompt = state
        .relay
        .transform(&request.input)
        .await
        .map_err(|error| {
            warn!(code = error.code(), %error, "failed to process prompt");
            ApiError::from(error)
        })?;

    Ok(Json(PromptResult { prompt }))
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(%detail, "request handler panicked");
    ApiError::ProcessingFailed.into_response()
}
