//! Hosted store reached through the backend's PostgREST interface.
//!
//! Every request carries the public key as `apikey`. Requests made through a
//! [`Store::scoped`] view also carry the user's access token so the backend's
//! row-level policies apply; the unscoped client falls back to the public key.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use postgrest::{Builder, Postgrest};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use kiln_types::models::{
    ChatThread, GeneratedCode, Message, NewGeneratedCode, NewMessage, NewProfile, NewProject,
    NewThread, Profile, Project,
};

use crate::store::Store;

#[derive(Clone)]
pub struct RestStore {
    client: Postgrest,
    token: String,
}

impl RestStore {
    pub fn new(backend_url: &str, public_key: &str) -> Self {
        let base = backend_url.trim_end_matches('/');
        let client = Postgrest::new(format!("{base}/rest/v1")).insert_header("apikey", public_key);

        debug!("Hosted store client created for {base}");
        Self {
            client,
            token: public_key.to_string(),
        }
    }

    fn table(&self, name: &str) -> Builder {
        self.client.from(name).auth(&self.token)
    }

    async fn fetch_one<T: DeserializeOwned>(&self, table: &str, id: Uuid) -> Result<Option<T>> {
        let rows: Vec<T> = read(
            self.table(table).select("*").eq("id", id.to_string()),
            table,
        )
        .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_one<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T> {
        let body = serde_json::to_string(body)?;
        let rows: Vec<T> = read(self.table(table).insert(body), table).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("{table}: insert returned no representation"))
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> Result<bool> {
        let builder = self.table(table).eq("id", id.to_string()).delete();
        let body = send(builder, table).await?;
        if body.trim().is_empty() {
            return Ok(true);
        }
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&body).with_context(|| format!("{table}: unexpected delete response"))?;
        Ok(!rows.is_empty())
    }
}

async fn send(builder: Builder, table: &str) -> Result<String> {
    let resp = builder
        .execute()
        .await
        .map_err(|e| anyhow!("{table}: request to hosted store failed: {e}"))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| anyhow!("{table}: failed to read hosted store response: {e}"))?;

    if !status.is_success() {
        bail!("{table}: hosted store returned {status}: {body}");
    }
    Ok(body)
}

async fn read<T: DeserializeOwned>(builder: Builder, table: &str) -> Result<T> {
    let body = send(builder, table).await?;
    serde_json::from_str(&body).with_context(|| format!("{table}: unexpected hosted store response"))
}

#[async_trait]
impl Store for RestStore {
    fn scoped(&self, access_token: &str) -> Box<dyn Store> {
        Box::new(Self {
            client: self.client.clone(),
            token: access_token.to_string(),
        })
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile> {
        let body = serde_json::to_string(profile)?;
        let rows: Vec<Profile> = read(
            self.table("profiles").upsert(body).on_conflict("id"),
            "profiles",
        )
        .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("profiles: upsert returned no representation"))
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        self.fetch_one("profiles", id).await
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        read(
            self.table("projects")
                .select("*")
                .eq("user_id", user_id.to_string())
                .order("updated_at.desc"),
            "projects",
        )
        .await
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project> {
        self.insert_one("projects", project).await
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        self.fetch_one("projects", id).await
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool> {
        self.delete_by_id("projects", id).await
    }

    async fn list_threads(&self, project_id: Uuid) -> Result<Vec<ChatThread>> {
        read(
            self.table("chat_threads")
                .select("*")
                .eq("project_id", project_id.to_string())
                .order("updated_at.desc"),
            "chat_threads",
        )
        .await
    }

    async fn create_thread(&self, thread: &NewThread) -> Result<ChatThread> {
        self.insert_one("chat_threads", thread).await
    }

    async fn get_thread(&self, id: Uuid) -> Result<Option<ChatThread>> {
        self.fetch_one("chat_threads", id).await
    }

    async fn delete_thread(&self, id: Uuid) -> Result<bool> {
        self.delete_by_id("chat_threads", id).await
    }

    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>> {
        read(
            self.table("messages")
                .select("*")
                .eq("thread_id", thread_id.to_string())
                .order("created_at.asc"),
            "messages",
        )
        .await
    }

    async fn insert_message(&self, message: &NewMessage) -> Result<Message> {
        self.insert_one("messages", message).await
    }

    async fn list_generated_code(&self, thread_id: Uuid) -> Result<Vec<GeneratedCode>> {
        read(
            self.table("generated_code")
                .select("*")
                .eq("thread_id", thread_id.to_string())
                .order("created_at.asc"),
            "generated_code",
        )
        .await
    }

    async fn insert_generated_code(&self, files: &[NewGeneratedCode]) -> Result<Vec<GeneratedCode>> {
        if files.is_empty() {
            return Ok(vec![]);
        }
        let body = serde_json::to_string(files)?;
        read(self.table("generated_code").insert(body), "generated_code").await
    }

    async fn get_generated_code(&self, id: Uuid) -> Result<Option<GeneratedCode>> {
        self.fetch_one("generated_code", id).await
    }
}
