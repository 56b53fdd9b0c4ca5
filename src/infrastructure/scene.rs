#[cfg(test)]
#[path = "scene_test.rs"]
mod tests;

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::domain::models::SceneContextSource;

/// Reads the scene snapshot a Blender add-on writes to disk. The file is read
/// again for every prompt so the assistant always sees the latest selection.
pub struct FileSceneContext {
    path: Option<PathBuf>,
}

impl FileSceneContext {
    pub fn new(path: Option<PathBuf>) -> FileSceneContext {
        return FileSceneContext { path };
    }
}

#[async_trait]
impl SceneContextSource for FileSceneContext {
    #[allow(clippy::implicit_return)]
    async fn snapshot(&self) -> Result<Value> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(Value::Object(Default::default())),
        };

        let raw = fs::read_to_string(path)
            .await
            .with_context(|| return format!("could not read {}", path.display()))?;
        let value = serde_json::from_str::<Value>(&raw)
            .with_context(|| return format!("{} is not valid JSON", path.display()))?;

        return Ok(value);
    }
}

/// A fixed snapshot, for hosts that hand the context over up front.
pub struct StaticSceneContext {
    value: Value,
}

impl StaticSceneContext {
    pub fn new(value: Value) -> StaticSceneContext {
        return StaticSceneContext { value };
    }
}

#[async_trait]
impl SceneContextSource for StaticSceneContext {
    #[allow(clippy::implicit_return)]
    async fn snapshot(&self) -> Result<Value> {
        return Ok(self.value.clone());
    }
}
