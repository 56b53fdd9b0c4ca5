#[cfg(test)]
#[path = "conversation_store_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use thiserror::Error;

use crate::domain::models::Message;
use crate::domain::models::Session;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("No session with id {0}")]
    UnknownSession(String),

    #[error("Cannot delete the last remaining session")]
    LastSession,
}

/// Every chat session plus the active-session pointer. Sessions keep
/// insertion order; `active` is always a valid index while the store holds
/// at least one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStore {
    sessions: Vec<Session>,
    active: usize,
    #[serde(skip)]
    max_message_count: usize,
}

impl ConversationStore {
    pub fn new(max_message_count: usize) -> ConversationStore {
        return ConversationStore {
            sessions: vec![],
            active: 0,
            max_message_count,
        };
    }

    /// Applies a new bound, trimming sessions that are already over it.
    pub fn set_max_message_count(&mut self, max_message_count: usize) {
        self.max_message_count = max_message_count;
        for idx in 0..self.sessions.len() {
            self.evict(idx);
        }
    }

    pub fn max_message_count(&self) -> usize {
        return self.max_message_count;
    }

    pub fn sessions(&self) -> &[Session] {
        return &self.sessions;
    }

    pub fn active_index(&self) -> usize {
        return self.active;
    }

    /// Adds a session and makes it active. An empty name gets a numbered
    /// default.
    pub fn add_session(&mut self, name: &str) -> String {
        let name = if name.trim().is_empty() {
            format!("Chat {}", self.sessions.len() + 1)
        } else {
            name.trim().to_string()
        };

        let session = Session::new(&name);
        let id = session.id.to_string();
        self.sessions.push(session);
        self.active = self.sessions.len() - 1;

        tracing::debug!(session_id = id, name = name, "Added session");
        return id;
    }

    pub fn delete_session(&mut self, id: &str) -> Result<(), StoreError> {
        let idx = self.position(id)?;
        if self.sessions.len() <= 1 {
            return Err(StoreError::LastSession);
        }

        self.sessions.remove(idx);
        if self.active > idx || self.active >= self.sessions.len() {
            self.active = self.active.saturating_sub(1);
        }

        tracing::debug!(session_id = id, "Deleted session");
        return Ok(());
    }

    pub fn select_session(&mut self, id: &str) -> Result<(), StoreError> {
        self.active = self.position(id)?;
        return Ok(());
    }

    pub fn rename_session(&mut self, id: &str, name: &str) -> Result<(), StoreError> {
        let idx = self.position(id)?;
        self.sessions[idx].name = name.trim().to_string();
        return Ok(());
    }

    /// Appends in insertion order, then evicts the oldest messages while the
    /// session is over the bound.
    pub fn append_message(&mut self, session_id: &str, message: Message) -> Result<(), StoreError> {
        let idx = self.position(session_id)?;
        self.sessions[idx].messages.push(message);
        self.evict(idx);
        return Ok(());
    }

    pub fn clear(&mut self, session_id: &str) -> Result<(), StoreError> {
        let idx = self.position(session_id)?;
        let session = &mut self.sessions[idx];
        session.messages.clear();
        session.cursor = 0;
        return Ok(());
    }

    /// The active session, creating a default one when the store is empty.
    pub fn ensure_session(&mut self) -> &mut Session {
        if self.sessions.is_empty() {
            self.add_session("");
        }
        self.normalize();
        return &mut self.sessions[self.active];
    }

    pub fn active_session(&self) -> Option<&Session> {
        return self.sessions.get(self.active);
    }

    pub fn active_session_id(&mut self) -> String {
        return self.ensure_session().id.to_string();
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        return self.sessions.iter().find(|e| return e.id == id);
    }

    pub fn session_mut(&mut self, id: &str) -> Option<&mut Session> {
        return self.sessions.iter_mut().find(|e| return e.id == id);
    }

    /// Restores the invariants after loading from disk.
    pub fn normalize(&mut self) {
        if self.active >= self.sessions.len() {
            self.active = self.sessions.len().saturating_sub(1);
        }
        for session in self.sessions.iter_mut() {
            session.clamp_cursor();
        }
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        return self
            .sessions
            .iter()
            .position(|e| return e.id == id)
            .ok_or_else(|| return StoreError::UnknownSession(id.to_string()));
    }

    fn evict(&mut self, idx: usize) {
        if self.max_message_count == 0 {
            return;
        }

        let session = &mut self.sessions[idx];
        let len = session.messages.len();
        if len <= self.max_message_count {
            return;
        }

        let excess = len - self.max_message_count;
        session.messages.drain(..excess);
        session.cursor = session.cursor.saturating_sub(excess);
        session.clamp_cursor();

        tracing::debug!(session_id = session.id, evicted = excess, "Evicted messages");
    }
}
