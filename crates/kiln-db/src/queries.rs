use crate::Database;
use crate::models::{CodeRow, MessageRow, ProfileRow, ProjectRow, ThreadRow, timestamp};
use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use kiln_types::models::{
    ChatThread, GeneratedCode, Message, NewGeneratedCode, NewMessage, NewProfile, NewProject,
    NewThread, Profile, Project,
};

const PROFILE_COLUMNS: &str = "id, email, full_name, avatar_url, provider, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, user_id, name, description, created_at, updated_at";
const THREAD_COLUMNS: &str = "id, user_id, project_id, title, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, thread_id, role, content, metadata, created_at";
const CODE_COLUMNS: &str = "id, thread_id, message_id, file_path, content, language, created_at";

impl Database {
    // -- Profiles --

    /// Insert or refresh the profile for an auth user. `created_at` survives
    /// subsequent sign-ins.
    pub fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile> {
        self.with_conn(|conn| {
            let now = timestamp(profile.updated_at);
            conn.execute(
                "INSERT INTO profiles (id, email, full_name, avatar_url, provider, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    email = excluded.email,
                    full_name = excluded.full_name,
                    avatar_url = excluded.avatar_url,
                    provider = excluded.provider,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    profile.id.to_string(),
                    profile.email,
                    profile.full_name,
                    profile.avatar_url,
                    profile.provider,
                    now,
                ],
            )?;
            query_profile(conn, profile.id)?
                .ok_or_else(|| anyhow::anyhow!("Profile vanished after upsert: {}", profile.id))
        })
    }

    pub fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        self.with_conn(|conn| query_profile(conn, id))
    }

    // -- Projects --

    pub fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ?1
                 ORDER BY updated_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id.to_string()], project_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(Project::try_from).collect()
        })
    }

    pub fn create_project(&self, project: &NewProject) -> Result<Project> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            let now = timestamp(Utc::now());
            conn.execute(
                "INSERT INTO projects (id, user_id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![
                    id.to_string(),
                    project.user_id.to_string(),
                    project.name,
                    project.description,
                    now,
                ],
            )?;
            query_project(conn, id)?.ok_or_else(|| anyhow::anyhow!("Project vanished after insert: {}", id))
        })
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        self.with_conn(|conn| query_project(conn, id))
    }

    /// Returns whether a row was removed. Threads go with it.
    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM projects WHERE id = ?1", [id.to_string()])?;
            Ok(n > 0)
        })
    }

    // -- Threads --

    pub fn list_threads(&self, project_id: Uuid) -> Result<Vec<ChatThread>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {THREAD_COLUMNS} FROM chat_threads WHERE project_id = ?1
                 ORDER BY updated_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([project_id.to_string()], thread_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(ChatThread::try_from).collect()
        })
    }

    pub fn create_thread(&self, thread: &NewThread) -> Result<ChatThread> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            let now = timestamp(Utc::now());
            conn.execute(
                "INSERT INTO chat_threads (id, user_id, project_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![
                    id.to_string(),
                    thread.user_id.to_string(),
                    thread.project_id.map(|p| p.to_string()),
                    thread.title,
                    now,
                ],
            )?;
            query_thread(conn, id)?.ok_or_else(|| anyhow::anyhow!("Thread vanished after insert: {}", id))
        })
    }

    pub fn get_thread(&self, id: Uuid) -> Result<Option<ChatThread>> {
        self.with_conn(|conn| query_thread(conn, id))
    }

    /// Returns whether a row was removed. Messages and generated code go with it.
    pub fn delete_thread(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM chat_threads WHERE id = ?1", [id.to_string()])?;
            Ok(n > 0)
        })
    }

    // -- Messages --

    pub fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE thread_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([thread_id.to_string()], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(Message::try_from).collect()
        })
    }

    pub fn insert_message(&self, message: &NewMessage) -> Result<Message> {
        let id = Uuid::new_v4();
        let metadata = serde_json::to_string(&message.metadata)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, thread_id, role, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id.to_string(),
                    message.thread_id.to_string(),
                    message.role.as_str(),
                    message.content,
                    metadata,
                    timestamp(Utc::now()),
                ],
            )?;
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
            let row = conn.query_row(&sql, [id.to_string()], message_row)?;
            Message::try_from(row)
        })
    }

    // -- Generated code --

    pub fn list_generated_code(&self, thread_id: Uuid) -> Result<Vec<GeneratedCode>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CODE_COLUMNS} FROM generated_code WHERE thread_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([thread_id.to_string()], code_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(GeneratedCode::try_from).collect()
        })
    }

    /// Insert all files of one assistant turn atomically.
    pub fn insert_generated_code(&self, files: &[NewGeneratedCode]) -> Result<Vec<GeneratedCode>> {
        if files.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut ids = Vec::with_capacity(files.len());
            for file in files {
                let id = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO generated_code (id, thread_id, message_id, file_path, content, language, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        id.to_string(),
                        file.thread_id.to_string(),
                        file.message_id.to_string(),
                        file.file_path,
                        file.content,
                        file.language,
                        timestamp(Utc::now()),
                    ],
                )?;
                ids.push(id);
            }
            tx.commit()?;

            ids.into_iter()
                .map(|id| {
                    query_code(conn, id)?
                        .ok_or_else(|| anyhow::anyhow!("Generated code vanished after insert: {}", id))
                })
                .collect()
        })
    }

    pub fn get_generated_code(&self, id: Uuid) -> Result<Option<GeneratedCode>> {
        self.with_conn(|conn| query_code(conn, id))
    }
}

fn query_profile(conn: &Connection, id: Uuid) -> Result<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
    let row = conn
        .query_row(&sql, [id.to_string()], |row| {
            Ok(ProfileRow {
                id: row.get(0)?,
                email: row.get(1)?,
                full_name: row.get(2)?,
                avatar_url: row.get(3)?,
                provider: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })
        .optional()?;

    row.map(Profile::try_from).transpose()
}

fn query_project(conn: &Connection, id: Uuid) -> Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
    let row = conn.query_row(&sql, [id.to_string()], project_row).optional()?;
    row.map(Project::try_from).transpose()
}

fn query_thread(conn: &Connection, id: Uuid) -> Result<Option<ChatThread>> {
    let sql = format!("SELECT {THREAD_COLUMNS} FROM chat_threads WHERE id = ?1");
    let row = conn.query_row(&sql, [id.to_string()], thread_row).optional()?;
    row.map(ChatThread::try_from).transpose()
}

fn query_code(conn: &Connection, id: Uuid) -> Result<Option<GeneratedCode>> {
    let sql = format!("SELECT {CODE_COLUMNS} FROM generated_code WHERE id = ?1");
    let row = conn.query_row(&sql, [id.to_string()], code_row).optional()?;
    row.map(GeneratedCode::try_from).transpose()
}

fn project_row(row: &Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn thread_row(row: &Row<'_>) -> rusqlite::Result<ThreadRow> {
    Ok(ThreadRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        title: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        metadata: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn code_row(row: &Row<'_>) -> rusqlite::Result<CodeRow> {
    Ok(CodeRow {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        message_id: row.get(2)?,
        file_path: row.get(3)?,
        content: row.get(4)?,
        language: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_types::models::{MessageMetadata, Role};

    fn seeded() -> (Database, Uuid, Project, ChatThread) {
        let db = Database::open_in_memory().unwrap();
        let user_id = Uuid::new_v4();
        let project = db
            .create_project(&NewProject {
                user_id,
                name: "Landing page".into(),
                description: None,
            })
            .unwrap();
        let thread = db
            .create_thread(&NewThread {
                user_id,
                project_id: Some(project.id),
                title: "Hero section".into(),
            })
            .unwrap();
        (db, user_id, project, thread)
    }

    #[test]
    fn profile_upsert_keeps_created_at() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        let mut profile = NewProfile {
            id,
            email: "ada@example.com".into(),
            full_name: Some("Ada".into()),
            avatar_url: None,
            provider: Some("github".into()),
            updated_at: Utc::now(),
        };

        let first = db.upsert_profile(&profile).unwrap();
        profile.full_name = Some("Ada Lovelace".into());
        profile.updated_at = Utc::now() + chrono::Duration::seconds(5);
        let second = db.upsert_profile(&profile).unwrap();

        assert_eq!(second.id, id);
        assert_eq!(second.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn messages_come_back_in_creation_order_with_metadata() {
        let (db, _, _, thread) = seeded();

        db.insert_message(&NewMessage::user(thread.id, "make a login form")).unwrap();
        db.insert_message(&NewMessage::assistant(thread.id, "boom", MessageMetadata::network_error()))
            .unwrap();

        let messages = db.list_messages(thread.id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].metadata.network_error);
    }

    #[test]
    fn deleting_a_project_cascades_to_threads_and_messages() {
        let (db, _, project, thread) = seeded();
        let reply = db
            .insert_message(&NewMessage::assistant(thread.id, "here", MessageMetadata::default()))
            .unwrap();
        db.insert_generated_code(&[NewGeneratedCode {
            thread_id: thread.id,
            message_id: reply.id,
            file_path: "dashboard.tsx".into(),
            content: "export default function Dashboard() {}".into(),
            language: "tsx".into(),
        }])
        .unwrap();

        assert!(db.delete_project(project.id).unwrap());
        assert!(db.get_thread(thread.id).unwrap().is_none());
        assert!(db.list_messages(thread.id).unwrap().is_empty());
        assert!(db.list_generated_code(thread.id).unwrap().is_empty());
        assert!(!db.delete_project(project.id).unwrap());
    }

    #[test]
    fn projects_are_scoped_to_their_owner() {
        let (db, user_id, project, _) = seeded();
        let other = Uuid::new_v4();

        assert_eq!(db.list_projects(user_id).unwrap()[0].id, project.id);
        assert!(db.list_projects(other).unwrap().is_empty());
    }
}
