use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use kiln_types::api::{ChatRequest, ChatResponse};

use crate::fallback;

const DEFAULT_UPSTREAM_ERROR: &str = "Failed to generate response";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The endpoint answered, but not with a success.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The endpoint could not be reached or its answer could not be read.
    #[error("network error: {0}")]
    Network(String),
}

/// Something that turns a chat turn into an assistant reply.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, req: &ChatRequest) -> Result<ChatResponse, GenerateError>;
}

/// Primary generation endpoint speaking the `/api/chat-fallback` body shape.
pub struct HttpGenerator {
    client: reqwest::Client,
    url: Url,
    api_key: String,
}

impl HttpGenerator {
    pub fn new(client: reqwest::Client, url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url,
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct UpstreamError {
    error: Option<String>,
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, req: &ChatRequest) -> Result<ChatResponse, GenerateError> {
        debug!(url = %self.url, history = req.messages.len(), "Calling generation endpoint");

        let resp = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .map_err(|e| GenerateError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| GenerateError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<UpstreamError>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| DEFAULT_UPSTREAM_ERROR.to_string());
            warn!(%status, "Generation endpoint returned an error: {}", message);
            return Err(GenerateError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            GenerateError::Network(format!("unreadable generation response: {e}"))
        })
    }
}

/// In-process stand-in used when no generation endpoint is configured.
pub struct FallbackGenerator;

#[async_trait]
impl Generator for FallbackGenerator {
    async fn generate(&self, req: &ChatRequest) -> Result<ChatResponse, GenerateError> {
        Ok(fallback::respond(req))
    }
}
