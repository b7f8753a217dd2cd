#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use kiln_api::chat::ChatOrchestrator;
use kiln_api::middleware::Claims;
use kiln_api::provider::{AuthError, AuthProvider, AuthSession};
use kiln_api::{AppState, AppStateInner};
use kiln_db::{Database, Store};
use kiln_generate::{EndpointChain, FallbackGenerator, Generator};

pub const JWT_SECRET: &str = "test-jwt-secret";

pub fn mint_token(user_id: Uuid, email: &str) -> String {
    let claims = Claims {
        sub: user_id,
        email: Some(email.to_string()),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        aud: "authenticated".into(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

/// Auth provider double that records every code it is asked to exchange.
pub struct StubAuth {
    pub outcome: Result<AuthSession, String>,
    pub exchanged: Mutex<Vec<(String, Option<String>)>>,
    pub signed_out: Mutex<Vec<String>>,
}

impl StubAuth {
    pub fn accepting(session: AuthSession) -> Self {
        Self {
            outcome: Ok(session),
            exchanged: Mutex::new(Vec::new()),
            signed_out: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            exchanged: Mutex::new(Vec::new()),
            signed_out: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuthProvider for StubAuth {
    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<AuthSession, AuthError> {
        self.exchanged
            .lock()
            .unwrap()
            .push((code.to_string(), verifier.map(str::to_string)));
        self.outcome.clone().map_err(AuthError::Rejected)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub db: Database,
    pub auth: Arc<StubAuth>,
}

pub struct Builder {
    auth: StubAuth,
    generator: Arc<dyn Generator>,
    endpoints: Vec<Url>,
    store: Option<Arc<dyn Store>>,
}

impl Builder {
    pub fn auth(mut self, auth: StubAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn endpoints(mut self, endpoints: Vec<Url>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Replace the in-memory database behind the routes.
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> TestApp {
        let db = Database::open_in_memory().unwrap();
        let auth = Arc::new(self.auth);
        let state: AppState = Arc::new(AppStateInner {
            store: self.store.unwrap_or_else(|| Arc::new(db.clone()) as Arc<dyn Store>),
            auth: auth.clone(),
            chat: ChatOrchestrator::new(self.generator),
            proxy: EndpointChain::new(reqwest::Client::new(), self.endpoints),
            jwt_secret: JWT_SECRET.to_string(),
            secure_cookies: true,
        });

        TestApp {
            router: kiln_api::router(state.clone()),
            state,
            db,
            auth,
        }
    }
}

pub fn app() -> Builder {
    Builder {
        auth: StubAuth::rejecting("no exchange expected"),
        generator: Arc::new(FallbackGenerator),
        endpoints: Vec::new(),
        store: None,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

pub fn set_cookies(resp: &Response<Body>) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("missing location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
