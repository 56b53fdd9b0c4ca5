#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::format_timestamp;
use super::Message;

/// One chat thread. `cursor` is the index of the message the view is
/// anchored on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub messages: Vec<Message>,
    pub cursor: usize,
    pub created_at: String,
}

impl Session {
    pub fn new(name: &str) -> Session {
        return Session {
            id: Session::create_id(),
            name: name.to_string(),
            messages: vec![],
            cursor: 0,
            created_at: format_timestamp(),
        };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .enumerate()
            .filter_map(|(idx, str)| {
                if idx > 1 {
                    return None;
                }
                return Some(str);
            })
            .collect::<Vec<&str>>()
            .join("-");
    }

    pub fn up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn down(&mut self) {
        self.cursor = (self.cursor + 1).min(self.messages.len().saturating_sub(1));
    }

    pub fn last(&mut self) {
        self.cursor = self.messages.len().saturating_sub(1);
    }

    /// Pulls the cursor back in range after the message list shrank.
    pub fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.messages.len().saturating_sub(1));
    }
}
