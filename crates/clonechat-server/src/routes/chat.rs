//! POST /clone_chat

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::state::AppState;
use clonechat_chat::{CloneChatRequest, CloneChatResponse, ErrorBody, INTERNAL_ERROR, MISSING_QUESTION};
use clonechat_core::{Error, ErrorKind};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/clone_chat", post(clone_chat))
}

/// Caller-visible failure. Carries no detail beyond its fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    MissingQuestion,
    Internal,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e.kind() {
            ErrorKind::Validation => {
                warn!("Rejected question: {}", e);
                ApiError::MissingQuestion
            }
            ErrorKind::Upstream => {
                error!("Clone chat failed: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingQuestion => (StatusCode::BAD_REQUEST, MISSING_QUESTION),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR),
        };
        (
            status,
            Json(ErrorBody {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

async fn clone_chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CloneChatRequest>, JsonRejection>,
) -> Result<Json<CloneChatResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        let question = match body {
            Ok(Json(CloneChatRequest {
                question: Some(question),
            })) => question,
            Ok(_) => {
                warn!("Request has no question");
                return Err(ApiError::MissingQuestion);
            }
            Err(rejection) => {
                warn!("Unreadable request body: {}", rejection.body_text());
                return Err(ApiError::MissingQuestion);
            }
        };

        let response = state.gateway.answer(&question).await?;
        Ok(Json(CloneChatResponse { response }))
    }
    .instrument(info_span!("clone_chat", %request_id))
    .await
}
