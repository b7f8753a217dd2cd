use axum::{
    Extension,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
};
use uuid::Uuid;

use kiln_db::Store;
use kiln_preview::{CSP_SANDBOX, bundle_file_name, export_bundle, render_document, sandbox_frame};
use kiln_types::models::GeneratedCode;

use crate::error::ApiError;
use crate::middleware::Session;
use crate::projects::owned_thread;
use crate::state::AppState;

// A code row is visible to whoever owns its thread
async fn owned_code(store: &dyn Store, session: &Session, id: Uuid) -> Result<GeneratedCode, ApiError> {
    let code = store
        .get_generated_code(id)
        .await?
        .ok_or(ApiError::NotFound("Code"))?;
    owned_thread(store, session, code.thread_id)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::NotFound("Code"),
            other => other,
        })?;
    Ok(code)
}

/// The runnable preview document, served under a sandbox policy.
pub async fn preview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(code_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = session.store(&state);
    let code = owned_code(store.as_ref(), &session, code_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CONTENT_SECURITY_POLICY, CSP_SANDBOX),
        ],
        render_document(&code.file_path, &code.content),
    ))
}

/// The preview document embedded in a sandboxed iframe.
pub async fn frame(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(code_id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let store = session.store(&state);
    let code = owned_code(store.as_ref(), &session, code_id).await?;
    Ok(Html(sandbox_frame(&render_document(&code.file_path, &code.content))))
}

pub async fn export(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(thread_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = session.store(&state);
    owned_thread(store.as_ref(), &session, thread_id).await?;
    let files = store.list_generated_code(thread_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", bundle_file_name(thread_id)),
            ),
        ],
        export_bundle(&files),
    ))
}
