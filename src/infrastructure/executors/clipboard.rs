use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Executor;
use crate::domain::models::ExecutorName;

/// Places code on the system clipboard so it can be pasted into Blender's
/// text editor. The handle is kept for the life of the executor, as some
/// platforms drop clipboard contents once it is released.
#[derive(Default)]
pub struct ClipboardExecutor {
    clipboard: Mutex<Option<arboard::Clipboard>>,
}

impl ClipboardExecutor {
    pub fn copy(&self, text: &str) -> Result<()> {
        let mut guard = self
            .clipboard
            .lock()
            .map_err(|_| return anyhow!("Clipboard lock was poisoned"))?;

        if guard.is_none() {
            *guard = Some(arboard::Clipboard::new()?);
        }

        if let Some(clipboard) = guard.as_mut() {
            clipboard.set_text(text.to_string())?;
        }

        return Ok(());
    }
}

#[async_trait]
impl Executor for ClipboardExecutor {
    fn name(&self) -> ExecutorName {
        return ExecutorName::Clipboard;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if let Err(err) = arboard::Clipboard::new() {
            return Err(anyhow!(format!(
                "Clipboard executor failed to initialize: {err}"
            )));
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn execute(&self, code: &str) -> Result<String> {
        self.copy(code)?;
        return Ok("Code copied to clipboard. Paste it into Blender's Text Editor and run it.".to_string());
    }
}
