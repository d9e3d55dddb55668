//! Liveness probe.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use clonechat_chat::HealthResponse;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// GET /health. Answers from startup state only and never calls the provider.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        collection: state.index.collection.clone(),
        passages: state.index.passages,
        embedding_model: state.index.embedding_model.clone(),
        chat_model: state.gateway.generator_model().to_string(),
        top_k: state.config.top_k,
    })
}
