//! Ordered multi-endpoint forwarding.
//!
//! Endpoints are tried strictly in order, with no delay between attempts.
//! The first endpoint that answers 2xx with a JSON body wins and its body is
//! handed back byte for byte. Every failure is recorded so the caller can report
//! the whole trail.

use std::fmt;

use serde::Serialize;
use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use kiln_types::api::ProxyRequest;

pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://v0.dev/api/chat",
    "https://api.v0.dev/generate",
    "https://v0.dev/api/generate",
];

const UPSTREAM_MODEL: &str = "gpt-4";
const UPSTREAM_TEMPERATURE: f32 = 0.7;
const UPSTREAM_MAX_TOKENS: u32 = 4000;
const USER_AGENT: &str = concat!("kiln/", env!("CARGO_PKG_VERSION"));

/// Body sent to each upstream endpoint.
#[derive(Debug, Serialize)]
struct UpstreamBody<'a> {
    prompt: &'a str,
    messages: &'a [Value],
    model: &'static str,
    temperature: f32,
    max_tokens: u32,
}

/// Why one endpoint was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptFailure {
    pub endpoint: String,
    pub reason: String,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("All generation endpoints failed. Last error: {}", last_error(.attempts))]
pub struct ChainExhausted {
    pub attempts: Vec<AttemptFailure>,
}

impl ChainExhausted {
    pub fn last(&self) -> Option<&AttemptFailure> {
        self.attempts.last()
    }
}

fn last_error(attempts: &[AttemptFailure]) -> String {
    attempts
        .last()
        .map(ToString::to_string)
        .unwrap_or_else(|| "no endpoints configured".to_string())
}

#[derive(Clone)]
pub struct EndpointChain {
    client: reqwest::Client,
    endpoints: Vec<Url>,
}

impl EndpointChain {
    pub fn new(client: reqwest::Client, endpoints: Vec<Url>) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    /// Returns the winning endpoint's raw JSON body.
    pub async fn forward(&self, req: &ProxyRequest) -> Result<String, ChainExhausted> {
        let body = UpstreamBody {
            prompt: &req.message,
            messages: &req.messages,
            model: UPSTREAM_MODEL,
            temperature: UPSTREAM_TEMPERATURE,
            max_tokens: UPSTREAM_MAX_TOKENS,
        };

        let mut attempts = Vec::new();

        for endpoint in &self.endpoints {
            debug!(%endpoint, "Trying generation endpoint");
            match self.attempt(endpoint, &body).await {
                Ok(body) => {
                    info!(%endpoint, failed_before = attempts.len(), "Generation endpoint succeeded");
                    return Ok(body);
                }
                Err(reason) => {
                    warn!(%endpoint, "Generation endpoint failed: {}", reason);
                    attempts.push(AttemptFailure {
                        endpoint: endpoint.to_string(),
                        reason,
                    });
                }
            }
        }

        Err(ChainExhausted { attempts })
    }

    async fn attempt(&self, endpoint: &Url, body: &UpstreamBody<'_>) -> Result<String, String> {
        let resp = self
            .client
            .post(endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status.to_string());
        }

        let text = resp.text().await.map_err(|e| e.to_string())?;
        serde_json::from_str::<IgnoredAny>(&text).map_err(|e| format!("invalid JSON body: {e}"))?;
        Ok(text)
    }
}
