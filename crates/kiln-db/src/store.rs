use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use kiln_types::models::{
    ChatThread, GeneratedCode, Message, NewGeneratedCode, NewMessage, NewProfile, NewProject,
    NewThread, Profile, Project,
};

use crate::Database;

/// Persistence seam for the five tables. Implemented by the hosted REST
/// store and by the local SQLite database.
#[async_trait]
pub trait Store: Send + Sync {
    /// A view of the store that acts on behalf of the holder of `access_token`.
    fn scoped(&self, access_token: &str) -> Box<dyn Store>;

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile>;
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>>;

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>>;
    async fn create_project(&self, project: &NewProject) -> Result<Project>;
    async fn get_project(&self, id: Uuid) -> Result<Option<Project>>;
    async fn delete_project(&self, id: Uuid) -> Result<bool>;

    async fn list_threads(&self, project_id: Uuid) -> Result<Vec<ChatThread>>;
    async fn create_thread(&self, thread: &NewThread) -> Result<ChatThread>;
    async fn get_thread(&self, id: Uuid) -> Result<Option<ChatThread>>;
    async fn delete_thread(&self, id: Uuid) -> Result<bool>;

    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>>;
    async fn insert_message(&self, message: &NewMessage) -> Result<Message>;

    async fn list_generated_code(&self, thread_id: Uuid) -> Result<Vec<GeneratedCode>>;
    async fn insert_generated_code(&self, files: &[NewGeneratedCode]) -> Result<Vec<GeneratedCode>>;
    async fn get_generated_code(&self, id: Uuid) -> Result<Option<GeneratedCode>>;
}

impl Database {
    // Run blocking SQLite work off the async runtime
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
    }
}

#[async_trait]
impl Store for Database {
    fn scoped(&self, _access_token: &str) -> Box<dyn Store> {
        Box::new(self.clone())
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile> {
        let profile = profile.clone();
        self.blocking(move |db| db.upsert_profile(&profile)).await
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        self.blocking(move |db| db.get_profile(id)).await
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        self.blocking(move |db| db.list_projects(user_id)).await
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project> {
        let project = project.clone();
        self.blocking(move |db| db.create_project(&project)).await
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        self.blocking(move |db| db.get_project(id)).await
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool> {
        self.blocking(move |db| db.delete_project(id)).await
    }

    async fn list_threads(&self, project_id: Uuid) -> Result<Vec<ChatThread>> {
        self.blocking(move |db| db.list_threads(project_id)).await
    }

    async fn create_thread(&self, thread: &NewThread) -> Result<ChatThread> {
        let thread = thread.clone();
        self.blocking(move |db| db.create_thread(&thread)).await
    }

    async fn get_thread(&self, id: Uuid) -> Result<Option<ChatThread>> {
        self.blocking(move |db| db.get_thread(id)).await
    }

    async fn delete_thread(&self, id: Uuid) -> Result<bool> {
        self.blocking(move |db| db.delete_thread(id)).await
    }

    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>> {
        self.blocking(move |db| db.list_messages(thread_id)).await
    }

    async fn insert_message(&self, message: &NewMessage) -> Result<Message> {
        let message = message.clone();
        self.blocking(move |db| db.insert_message(&message)).await
    }

    async fn list_generated_code(&self, thread_id: Uuid) -> Result<Vec<GeneratedCode>> {
        self.blocking(move |db| db.list_generated_code(thread_id)).await
    }

    async fn insert_generated_code(&self, files: &[NewGeneratedCode]) -> Result<Vec<GeneratedCode>> {
        let files = files.to_vec();
        self.blocking(move |db| db.insert_generated_code(&files)).await
    }

    async fn get_generated_code(&self, id: Uuid) -> Result<Option<GeneratedCode>> {
        self.blocking(move |db| db.get_generated_code(id)).await
    }
}
