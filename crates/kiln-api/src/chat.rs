//! Drives one chat exchange: record the user's turn, ask the generator for a
//! reply and record whatever comes back, including failures.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use kiln_db::Store;
use kiln_generate::{GenerateError, Generator};
use kiln_types::api::{ChatRequest, HistoryEntry};
use kiln_types::models::{GeneratedCode, Message, MessageMetadata, NewGeneratedCode, NewMessage};

const DEFAULT_LANGUAGE: &str = "tsx";
const NETWORK_ERROR_REPLY: &str =
    "❌ Network error: Unable to connect to AI service. Please check your internet connection and try again.";

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Message content is empty")]
    Empty,

    #[error("A reply is already being generated for this thread")]
    Busy,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// The rows one exchange produced.
#[derive(Debug)]
pub struct Exchange {
    pub user: Message,
    pub reply: Message,
    pub code: Vec<GeneratedCode>,
}

pub struct ChatOrchestrator {
    generator: Arc<dyn Generator>,
    in_flight: Mutex<HashSet<Uuid>>,
}

// Clears the thread's loading flag however the exchange ends
struct LoadingGuard<'a> {
    in_flight: &'a Mutex<HashSet<Uuid>>,
    thread_id: Uuid,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.thread_id);
    }
}

impl ChatOrchestrator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_loading(&self, thread_id: Uuid) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&thread_id)
    }

    fn begin(&self, thread_id: Uuid) -> Option<LoadingGuard<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(thread_id) {
            return None;
        }
        Some(LoadingGuard {
            in_flight: &self.in_flight,
            thread_id,
        })
    }

    pub async fn send(&self, store: &dyn Store, thread_id: Uuid, content: &str) -> Result<Exchange, SendError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SendError::Empty);
        }

        let _guard = self.begin(thread_id).ok_or(SendError::Busy)?;

        let history: Vec<HistoryEntry> = store
            .list_messages(thread_id)
            .await?
            .into_iter()
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content,
            })
            .collect();

        let user = store.insert_message(&NewMessage::user(thread_id, content)).await?;

        let req = ChatRequest {
            message: content.to_string(),
            thread_id: Some(thread_id),
            messages: history,
        };

        debug!(%thread_id, history = req.messages.len(), "Requesting assistant reply");

        let (reply, blocks) = match self.generator.generate(&req).await {
            Ok(resp) => (NewMessage::assistant(thread_id, resp.message, resp.metadata), resp.code),
            Err(GenerateError::Upstream { status, message }) => {
                warn!(%thread_id, status, "Generation failed: {}", message);
                let text = format!("❌ Error: {message}");
                (NewMessage::assistant(thread_id, text, MessageMetadata::upstream_error()), Vec::new())
            }
            Err(GenerateError::Network(e)) => {
                warn!(%thread_id, "Generation endpoint unreachable: {}", e);
                (
                    NewMessage::assistant(thread_id, NETWORK_ERROR_REPLY, MessageMetadata::network_error()),
                    Vec::new(),
                )
            }
        };

        let reply = store.insert_message(&reply).await?;

        let files: Vec<NewGeneratedCode> = blocks
            .into_iter()
            .map(|block| NewGeneratedCode {
                thread_id,
                message_id: reply.id,
                file_path: block.file_path,
                content: block.content,
                language: block.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            })
            .collect();

        let code = if files.is_empty() {
            Vec::new()
        } else {
            store.insert_generated_code(&files).await?
        };

        Ok(Exchange { user, reply, code })
    }
}
