use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use kiln_db::Store;
use kiln_types::api::{CreateProjectRequest, CreateThreadRequest};
use kiln_types::models::{ChatThread, NewProject, NewThread, Project};

use crate::error::ApiError;
use crate::middleware::Session;
use crate::state::AppState;

/// Load a project the caller owns. Someone else's project is reported as missing.
pub(crate) async fn owned_project(store: &dyn Store, session: &Session, id: Uuid) -> Result<Project, ApiError> {
    store
        .get_project(id)
        .await?
        .filter(|p| p.user_id == session.user_id)
        .ok_or(ApiError::NotFound("Project"))
}

pub(crate) async fn owned_thread(store: &dyn Store, session: &Session, id: Uuid) -> Result<ChatThread, ApiError> {
    store
        .get_thread(id)
        .await?
        .filter(|t| t.user_id == session.user_id)
        .ok_or(ApiError::NotFound("Thread"))
}

fn required(value: &str, field: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = session.store(&state).list_projects(session.user_id).await?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = required(&req.name, "Project name")?;
    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let project = session
        .store(&state)
        .create_project(&NewProject {
            user_id: session.user_id,
            name,
            description,
        })
        .await?;

    info!(project_id = %project.id, user_id = %session.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let store = session.store(&state);
    owned_project(store.as_ref(), &session, project_id).await?;

    if !store.delete_project(project_id).await? {
        return Err(ApiError::NotFound("Project"));
    }
    info!(%project_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_threads(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ChatThread>>, ApiError> {
    let store = session.store(&state);
    owned_project(store.as_ref(), &session, project_id).await?;
    Ok(Json(store.list_threads(project_id).await?))
}

pub async fn create_thread(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateThreadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = required(&req.title, "Thread title")?;
    let store = session.store(&state);
    owned_project(store.as_ref(), &session, project_id).await?;

    let thread = store
        .create_thread(&NewThread {
            user_id: session.user_id,
            project_id: Some(project_id),
            title,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(thread)))
}

pub async fn delete_thread(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(thread_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let store = session.store(&state);
    owned_thread(store.as_ref(), &session, thread_id).await?;

    if !store.delete_thread(thread_id).await? {
        return Err(ApiError::NotFound("Thread"));
    }
    Ok(StatusCode::NO_CONTENT)
}
