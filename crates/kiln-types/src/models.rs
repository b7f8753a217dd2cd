use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mirrors the auth identity. The id is the auth user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown message role '{other}'")),
        }
    }
}

/// Known metadata fields attached to a message.
///
/// Producers only ever set a handful of keys; anything else sent by a remote
/// generator is dropped on deserialization instead of leaking into storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub network_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Uuid>,
}

impl MessageMetadata {
    pub fn upstream_error() -> Self {
        Self {
            error: true,
            ..Self::default()
        }
    }

    pub fn network_error() -> Self {
        Self {
            error: true,
            network_error: true,
            ..Self::default()
        }
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
}

/// A source file produced by one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub message_id: Uuid,
    pub file_path: String,
    pub content: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

// -- Inserts --

#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewThread {
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub thread_id: Uuid,
    pub role: Role,
    pub content: String,
    pub metadata: MessageMetadata,
}

impl NewMessage {
    pub fn user(thread_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            thread_id,
            role: Role::User,
            content: content.into(),
            metadata: MessageMetadata::default(),
        }
    }

    pub fn assistant(thread_id: Uuid, content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            thread_id,
            role: Role::Assistant,
            content: content.into(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGeneratedCode {
    pub thread_id: Uuid,
    pub message_id: Uuid,
    pub file_path: String,
    pub content: String,
    pub language: String,
}
