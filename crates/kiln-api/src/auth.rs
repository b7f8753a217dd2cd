use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use kiln_types::api::{SessionResponse, SessionUser};

use crate::error::ApiError;
use crate::middleware::Session;
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

const SIGN_IN_PATH: &str = "/auth/sign-in";
const ACCESS_MAX_AGE_DAYS: i64 = 7;
const REFRESH_MAX_AGE_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Only local absolute paths are followed; anything else lands on `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => path,
        _ => "/",
    }
}

pub fn sign_in_redirect(message: &str) -> Redirect {
    Redirect::to(&format!("{SIGN_IN_PATH}?error={}", urlencoding::encode(message)))
}

fn session_cookie(name: &'static str, value: String, days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(days))
        .build()
}

// Expired cookie that overwrites `name` whether or not the request carried it
fn removal(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").http_only(true).build();
    cookie.make_removal();
    cookie
}

/// OAuth landing route: trade the code for a session, record the profile and
/// hand the tokens to the browser as cookies.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    if let Some(error) = query.error.as_deref() {
        let message = query.error_description.as_deref().unwrap_or(error);
        warn!("Identity provider returned an error: {}", message);
        return (jar, sign_in_redirect(message));
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return (jar, sign_in_redirect("Missing authorization code"));
    };

    let verifier = jar.get(CODE_VERIFIER_COOKIE).map(|c| c.value().to_string());

    let session = match state.auth.exchange_code(code, verifier.as_deref()).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Code exchange failed: {}", e);
            return (jar, sign_in_redirect(&format!("Could not complete sign in: {e}")));
        }
    };

    let profile = session.user.profile(chrono::Utc::now());
    let store = state.store.scoped(&session.access_token);
    if let Err(e) = store.upsert_profile(&profile).await {
        warn!(user_id = %profile.id, "Profile upsert failed: {:#}", e);
    }

    info!(user_id = %session.user.id, "User signed in");

    let secure = state.secure_cookies;
    let mut jar = jar
        .add(session_cookie(ACCESS_COOKIE, session.access_token, ACCESS_MAX_AGE_DAYS, secure))
        .add(session_cookie(REFRESH_COOKIE, session.refresh_token, REFRESH_MAX_AGE_DAYS, secure));
    if verifier.is_some() {
        jar = jar.add(removal(CODE_VERIFIER_COOKIE));
    }

    let next = safe_next(query.next.as_deref()).to_string();
    (jar, Redirect::to(&next))
}

pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Err(e) = state.auth.sign_out(&session.access_token).await {
        warn!(user_id = %session.user_id, "Provider sign-out failed: {}", e);
    }

    let jar = jar.add(removal(ACCESS_COOKIE)).add(removal(REFRESH_COOKIE));
    (jar, StatusCode::NO_CONTENT)
}

pub async fn session(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<SessionResponse>, ApiError> {
    let profile = session.store(&state).get_profile(session.user_id).await?;

    Ok(Json(SessionResponse {
        user: SessionUser {
            id: session.user_id,
            email: session.email,
        },
        profile,
    }))
}
