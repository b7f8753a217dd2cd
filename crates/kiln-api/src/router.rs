use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, generation, messages, preview, projects};

/// Every route the service exposes, minus the outer CORS and trace layers.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/chat-fallback", post(generation::chat_fallback))
        .route("/api/v0-proxy", post(generation::v0_proxy))
        .route("/health", get(|| async { "ok" }))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/session", get(auth::session))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/projects", get(projects::list_projects).post(projects::create_project))
        .route("/api/projects/{project_id}", delete(projects::delete_project))
        .route(
            "/api/projects/{project_id}/threads",
            get(projects::list_threads).post(projects::create_thread),
        )
        .route("/api/threads/{thread_id}", delete(projects::delete_thread))
        .route(
            "/api/threads/{thread_id}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/api/threads/{thread_id}/code", get(messages::list_code))
        .route("/api/threads/{thread_id}/code/export", get(preview::export))
        .route("/api/code/{code_id}/preview", get(preview::preview))
        .route("/api/code/{code_id}/frame", get(preview::frame))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
