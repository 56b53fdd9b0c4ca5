#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::Local;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;
use super::ProviderError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

/// Metadata about a file the user attached to a prompt. The file itself is
/// never read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub author: Author,
    pub text: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    mtype: MessageType,
}

pub fn format_timestamp() -> String {
    return Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string(),
            timestamp: format_timestamp(),
            code: None,
            attachment: None,
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(author: Author, mtype: MessageType, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string(),
            timestamp: format_timestamp(),
            code: None,
            attachment: None,
            mtype,
        };
    }

    /// Builds the assistant message that records a failed request in the
    /// transcript.
    pub fn from_failure(err: &ProviderError) -> Message {
        return Message::new_with_type(
            Author::Assistant,
            MessageType::Error,
            &format!("Error: {}: {err}", err.kind()),
        );
    }

    pub fn with_code(mut self, code: Option<String>) -> Message {
        self.code = code;
        return self;
    }

    pub fn with_attachment(mut self, attachment: Option<Attachment>) -> Message {
        self.attachment = attachment;
        return self;
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn has_code(&self) -> bool {
        return self.code.is_some();
    }
}
