//! Session registry keyed by conversation id
//!
//! Sessions live behind per-entry async mutexes, so turns within one
//! conversation are strictly ordered while distinct conversations proceed
//! in parallel. The registry is owned by the application and injected
//! wherever sessions are needed.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::llm::ChatModel;
use crate::session::chat::{ChatSession, SessionSettings};

/// All active chat sessions
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<ChatSession>>>,
    model: Arc<dyn ChatModel>,
    settings: Arc<SessionSettings>,
}

impl SessionRegistry {
    pub fn new(model: Arc<dyn ChatModel>, settings: SessionSettings) -> Self {
        info!("Session registry initialized");
        Self {
            sessions: DashMap::new(),
            model,
            settings: Arc::new(settings),
        }
    }

    /// Fetch the session for a conversation, creating it on first contact.
    /// Repeat calls return the same handle.
    pub fn get_or_create(&self, conversation_id: &str) -> Arc<Mutex<ChatSession>> {
        self.sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                info!("Creating session for conversation: {}", conversation_id);
                Arc::new(Mutex::new(ChatSession::new(
                    conversation_id,
                    self.model.clone(),
                    self.settings.clone(),
                )))
            })
            .clone()
    }

    /// Drop a session. Returns whether one existed.
    pub fn remove(&self, conversation_id: &str) -> bool {
        let removed = self.sessions.remove(conversation_id).is_some();
        if removed {
            info!("Removed session: {}", conversation_id);
        }
        removed
    }

    /// Number of active conversations.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every session.
    pub fn clear_all(&self) {
        info!("Clearing all sessions");
        self.sessions.clear();
    }
}
