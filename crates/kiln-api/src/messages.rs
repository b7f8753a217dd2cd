use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use kiln_types::api::{SendMessageRequest, SendMessageResponse};
use kiln_types::models::{GeneratedCode, Message};

use crate::chat::SendError;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::projects::owned_thread;
use crate::state::AppState;

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(thread_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let store = session.store(&state);
    owned_thread(store.as_ref(), &session, thread_id).await?;
    Ok(Json(store.list_messages(thread_id).await?))
}

pub async fn list_code(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(thread_id): Path<Uuid>,
) -> Result<Json<Vec<GeneratedCode>>, ApiError> {
    let store = session.store(&state);
    owned_thread(store.as_ref(), &session, thread_id).await?;
    Ok(Json(store.list_generated_code(thread_id).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(thread_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = session.store(&state);
    owned_thread(store.as_ref(), &session, thread_id).await?;

    let exchange = state
        .chat
        .send(store.as_ref(), thread_id, &req.content)
        .await
        .map_err(|e| match e {
            SendError::Empty => ApiError::BadRequest("Message content is empty".into()),
            SendError::Busy => ApiError::Busy,
            SendError::Store(e) => ApiError::Internal(e.context(format!("chat exchange on thread {thread_id}"))),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            messages: vec![exchange.user, exchange.reply],
            code: exchange.code,
        }),
    ))
}
