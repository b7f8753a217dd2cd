use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{GeneratedCode, Message, MessageMetadata, Profile, Role};

// -- Generation --

/// One prior turn handed to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    #[serde(default)]
    pub language: Option<String>,
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default)]
    pub code: Vec<CodeBlock>,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

/// Proxy input. `messages` is relayed upstream exactly as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<Value>,
}

// Clients send `messages: null` for an empty history
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// -- Projects & threads --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateThreadRequest {
    pub title: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Everything one send persisted: the user turn, the assistant turn and
/// any files attached to the assistant turn.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub messages: Vec<Message>,
    pub code: Vec<GeneratedCode>,
}

// -- Session --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: SessionUser,
    pub profile: Option<Profile>,
}
