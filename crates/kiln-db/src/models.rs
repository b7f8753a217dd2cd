//! SQLite row types. Everything is stored as TEXT and converted into the
//! kiln-types models on the way out, which keeps the DB layer independent of
//! the wire format.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use kiln_types::models::{ChatThread, GeneratedCode, Message, MessageMetadata, Profile, Project, Role};

pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ProjectRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ThreadRow {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub thread_id: String,
    pub role: String,
    pub content: String,
    pub metadata: String,
    pub created_at: String,
}

pub struct CodeRow {
    pub id: String,
    pub thread_id: String,
    pub message_id: String,
    pub file_path: String,
    pub content: String,
    pub language: String,
    pub created_at: String,
}

/// Microsecond RFC 3339 so that lexical order in SQLite is time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn uuid(field: &str, raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("corrupt {field} '{raw}'"))
}

fn time(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    raw.parse().with_context(|| format!("corrupt {field} '{raw}'"))
}

impl TryFrom<ProfileRow> for Profile {
    type Error = anyhow::Error;

    fn try_from(row: ProfileRow) -> Result<Self> {
        Ok(Profile {
            id: uuid("profile id", &row.id)?,
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            provider: row.provider,
            created_at: time("created_at", &row.created_at)?,
            updated_at: time("updated_at", &row.updated_at)?,
        })
    }
}

impl TryFrom<ProjectRow> for Project {
    type Error = anyhow::Error;

    fn try_from(row: ProjectRow) -> Result<Self> {
        Ok(Project {
            id: uuid("project id", &row.id)?,
            user_id: uuid("user_id", &row.user_id)?,
            name: row.name,
            description: row.description,
            created_at: time("created_at", &row.created_at)?,
            updated_at: time("updated_at", &row.updated_at)?,
        })
    }
}

impl TryFrom<ThreadRow> for ChatThread {
    type Error = anyhow::Error;

    fn try_from(row: ThreadRow) -> Result<Self> {
        Ok(ChatThread {
            id: uuid("thread id", &row.id)?,
            user_id: uuid("user_id", &row.user_id)?,
            project_id: row.project_id.as_deref().map(|p| uuid("project_id", p)).transpose()?,
            title: row.title,
            created_at: time("created_at", &row.created_at)?,
            updated_at: time("updated_at", &row.updated_at)?,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        let role: Role = row.role.parse().map_err(|e: String| anyhow!(e))?;
        let metadata: MessageMetadata = serde_json::from_str(&row.metadata)
            .with_context(|| format!("corrupt metadata on message '{}'", row.id))?;

        Ok(Message {
            id: uuid("message id", &row.id)?,
            thread_id: uuid("thread_id", &row.thread_id)?,
            role,
            content: row.content,
            metadata,
            created_at: time("created_at", &row.created_at)?,
        })
    }
}

impl TryFrom<CodeRow> for GeneratedCode {
    type Error = anyhow::Error;

    fn try_from(row: CodeRow) -> Result<Self> {
        Ok(GeneratedCode {
            id: uuid("generated_code id", &row.id)?,
            thread_id: uuid("thread_id", &row.thread_id)?,
            message_id: uuid("message_id", &row.message_id)?,
            file_path: row.file_path,
            content: row.content,
            language: row.language,
            created_at: time("created_at", &row.created_at)?,
        })
    }
}
