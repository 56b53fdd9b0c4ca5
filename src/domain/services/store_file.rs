#[cfg(test)]
#[path = "store_file_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;

use super::ConversationStore;

/// YAML persistence for the conversation store.
pub struct StoreFile {
    path: path::PathBuf,
}

impl StoreFile {
    pub fn new(path: path::PathBuf) -> StoreFile {
        return StoreFile { path };
    }

    pub fn path(&self) -> &path::Path {
        return &self.path;
    }

    /// Reads the store back, or starts an empty one when nothing was saved
    /// yet.
    pub async fn load(&self, max_message_count: usize) -> Result<ConversationStore> {
        if !self.path.exists() {
            return Ok(ConversationStore::new(max_message_count));
        }

        let payload = fs::read_to_string(&self.path).await?;
        let mut store: ConversationStore = serde_yaml::from_str(&payload)?;
        store.set_max_message_count(max_message_count);
        store.normalize();

        tracing::debug!(path = ?self.path, sessions = store.sessions().len(), "Loaded store");
        return Ok(store);
    }

    pub async fn save(&self, store: &ConversationStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_yaml::to_string(store)?;
        fs::write(&self.path, payload).await?;
        return Ok(());
    }
}
