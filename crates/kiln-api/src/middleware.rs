use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use kiln_db::Store;

use crate::auth::ACCESS_COOKIE;
use crate::error::ApiError;
use crate::state::AppState;

const AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    pub aud: String,
}

/// The authenticated caller, attached to every protected request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

impl Session {
    /// Store view that acts with this caller's credentials.
    pub fn store(&self, state: &AppState) -> Box<dyn Store> {
        state.store.scoped(&self.access_token)
    }
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUDIENCE]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected access token: {}", e);
            ApiError::Unauthorized
        })
}

// Bearer header first, then the session cookie set by the sign-in callback
fn access_token(req: &Request) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    CookieJar::from_headers(req.headers())
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
}

/// Validate the caller's access token and attach a [`Session`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = access_token(&req)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let claims = validate_token(&token, &state.jwt_secret)?;

    req.extensions_mut().insert(Session {
        user_id: claims.sub,
        email: claims.email,
        access_token: token,
    });
    Ok(next.run(req).await)
}
