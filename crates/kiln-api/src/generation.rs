use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use kiln_generate::AttemptFailure;
use kiln_types::api::{ChatRequest, ChatResponse, ProxyRequest};

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ExhaustedBody {
    error: String,
    attempts: Vec<AttemptFailure>,
}

/// Canned-template responder, reachable without a session.
pub async fn chat_fallback(Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    Json(kiln_generate::respond(&req))
}

/// Forward to the configured endpoints in order and relay the first success.
pub async fn v0_proxy(State(state): State<AppState>, Json(req): Json<ProxyRequest>) -> Response {
    match state.proxy.forward(&req).await {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(exhausted) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ExhaustedBody {
                error: exhausted.to_string(),
                attempts: exhausted.attempts,
            }),
        )
            .into_response(),
    }
}
