#[cfg(test)]
#[path = "transcript_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;

use crate::domain::models::MessageType;
use crate::domain::models::Session;

/// Plain-text rendering of a session used by `/export`.
pub fn format_transcript(session: &Session, show_timestamps: bool) -> String {
    let mut blocks = vec![format!(
        "# {}\nCreated: {}",
        session.name, session.created_at
    )];

    for message in session.messages.iter() {
        let mut header = message.author.to_string();
        if message.message_type() == MessageType::Error {
            header = format!("{header} (error)");
        }
        if show_timestamps {
            header = format!("[{}] {header}", message.timestamp);
        }

        let mut block = format!("{header}:\n{}", message.text.trim_end());
        if let Some(attachment) = &message.attachment {
            block += &format!("\nAttachment: {} ({})", attachment.name, attachment.path);
        }
        blocks.push(block);
    }

    return blocks.join("\n\n");
}

pub async fn export_transcript(
    file: &path::Path,
    session: &Session,
    show_timestamps: bool,
) -> Result<()> {
    fs::write(file, format_transcript(session, show_timestamps)).await?;
    return Ok(());
}
