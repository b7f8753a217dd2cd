//! Client for the hosted auth service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use kiln_types::models::NewProfile;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMetadata {
    pub provider: Option<String>,
}

/// The identity payload returned with a session.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

impl AuthUser {
    /// Best-effort profile from whatever the identity provider filled in.
    pub fn profile(&self, now: DateTime<Utc>) -> NewProfile {
        let meta = &self.user_metadata;
        NewProfile {
            id: self.id,
            email: self.email.clone().unwrap_or_default(),
            full_name: meta.full_name.clone().or_else(|| meta.name.clone()),
            avatar_url: meta.avatar_url.clone().or_else(|| meta.picture.clone()),
            provider: self.app_metadata.provider.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),

    #[error("auth service unreachable: {0}")]
    Network(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Trade an authorization code for a session.
    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<AuthSession, AuthError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// The backend's GoTrue-compatible auth endpoints under `/auth/v1`.
pub struct GoTrueAuth {
    client: reqwest::Client,
    base: String,
    public_key: String,
}

impl GoTrueAuth {
    pub fn new(client: reqwest::Client, backend_url: &str, public_key: &str) -> Self {
        Self {
            client,
            base: format!("{}/auth/v1", backend_url.trim_end_matches('/')),
            public_key: public_key.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|p| p.error_description.or(p.msg).or(p.message).or(p.error))
        .unwrap_or_else(|| format!("auth service returned {status}"))
}

#[async_trait]
impl AuthProvider for GoTrueAuth {
    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<AuthSession, AuthError> {
        debug!("Exchanging authorization code (length {})", code.len());

        let resp = self
            .client
            .post(format!("{}/token?grant_type=pkce", self.base))
            .header("apikey", &self.public_key)
            .json(&json!({ "auth_code": code, "code_verifier": verifier }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| AuthError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected(describe_failure(status, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| AuthError::Rejected(format!("unexpected session payload: {e}")))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(format!("{}/logout", self.base))
            .header("apikey", &self.public_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(AuthError::Rejected(describe_failure(status, &body)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{RawQuery, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::Value;

    use super::*;

    const PUBLIC_KEY: &str = "public-anon-key";
    const USER_ID: &str = "7b0c61a8-5a8e-4b55-8f5e-2f0f8f7f9d11";

    #[derive(Debug, Default)]
    struct Seen {
        query: Option<String>,
        apikey: Option<String>,
        authorization: Option<String>,
        body: Option<Value>,
    }

    type Log = Arc<Mutex<Seen>>;

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
    }

    async fn token(
        State(log): State<Log>,
        RawQuery(query): RawQuery,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let code = body["auth_code"].as_str().unwrap_or_default().to_string();
        *log.lock().unwrap() = Seen {
            query,
            apikey: header(&headers, "apikey"),
            authorization: None,
            body: Some(body),
        };

        if code == "stale" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_grant", "error_description": "Code expired" })),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "access_token": "access-abc",
                "refresh_token": "refresh-abc",
                "token_type": "bearer",
                "expires_in": 3600,
                "user": {
                    "id": USER_ID,
                    "email": "ada@example.com",
                    "user_metadata": { "full_name": "Ada Lovelace" },
                    "app_metadata": { "provider": "github" }
                }
            })),
        )
    }

    async fn logout(State(log): State<Log>, headers: HeaderMap) -> StatusCode {
        let mut seen = log.lock().unwrap();
        seen.apikey = header(&headers, "apikey");
        seen.authorization = header(&headers, "authorization");
        StatusCode::NO_CONTENT
    }

    // Stand-in for the backend's auth endpoints
    async fn spawn_auth() -> (GoTrueAuth, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(logout))
            .with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let auth = GoTrueAuth::new(reqwest::Client::new(), &format!("http://{addr}/"), PUBLIC_KEY);
        (auth, log)
    }

    #[tokio::test]
    async fn exchange_posts_code_and_verifier() {
        let (auth, log) = spawn_auth().await;

        let session = auth.exchange_code("fresh", Some("verifier-xyz")).await.unwrap();
        assert_eq!(session.access_token, "access-abc");
        assert_eq!(session.refresh_token, "refresh-abc");
        assert_eq!(session.user.id.to_string(), USER_ID);
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));

        let seen = log.lock().unwrap();
        assert_eq!(seen.query.as_deref(), Some("grant_type=pkce"));
        assert_eq!(seen.apikey.as_deref(), Some(PUBLIC_KEY));
        let body = seen.body.as_ref().unwrap();
        assert_eq!(body["auth_code"], "fresh");
        assert_eq!(body["code_verifier"], "verifier-xyz");
    }

    #[tokio::test]
    async fn rejected_exchange_surfaces_description() {
        let (auth, _log) = spawn_auth().await;

        let err = auth.exchange_code("stale", None).await.unwrap_err();
        match err {
            AuthError::Rejected(reason) => assert_eq!(reason, "Code expired"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let auth = GoTrueAuth::new(reqwest::Client::new(), &format!("http://{addr}"), PUBLIC_KEY);
        let err = auth.exchange_code("fresh", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)), "{err:?}");
    }

    #[tokio::test]
    async fn sign_out_sends_bearer_token() {
        let (auth, log) = spawn_auth().await;

        auth.sign_out("access-abc").await.unwrap();

        let seen = log.lock().unwrap();
        assert_eq!(seen.apikey.as_deref(), Some(PUBLIC_KEY));
        assert_eq!(seen.authorization.as_deref(), Some("Bearer access-abc"));
    }

    #[test]
    fn profile_prefers_full_name_and_avatar_url() {
        let user: AuthUser = serde_json::from_value(json!({
            "id": "7b0c61a8-5a8e-4b55-8f5e-2f0f8f7f9d11",
            "email": "grace@example.com",
            "user_metadata": {
                "full_name": "Grace Hopper",
                "name": "grace",
                "avatar_url": "https://img/a.png",
                "picture": "https://img/b.png"
            },
            "app_metadata": { "provider": "github" }
        }))
        .unwrap();

        let p = user.profile(Utc::now());
        assert_eq!(p.id, user.id);
        assert_eq!(p.full_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(p.avatar_url.as_deref(), Some("https://img/a.png"));
        assert_eq!(p.provider.as_deref(), Some("github"));
    }

    #[test]
    fn profile_falls_back_to_name_and_picture() {
        let user: AuthUser = serde_json::from_value(json!({
            "id": "7b0c61a8-5a8e-4b55-8f5e-2f0f8f7f9d11",
            "user_metadata": { "name": "grace", "picture": "https://img/b.png" }
        }))
        .unwrap();

        let p = user.profile(Utc::now());
        assert_eq!(p.email, "");
        assert_eq!(p.full_name.as_deref(), Some("grace"));
        assert_eq!(p.avatar_url.as_deref(), Some("https://img/b.png"));
        assert_eq!(p.provider, None);
    }

    #[test]
    fn failure_text_prefers_description() {
        let msg = describe_failure(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Code expired"}"#,
        );
        assert_eq!(msg, "Code expired");

        let msg = describe_failure(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(msg, "auth service returned 502 Bad Gateway");
    }
}
