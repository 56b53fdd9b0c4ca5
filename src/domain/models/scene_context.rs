use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Supplies the JSON snapshot of the host application forwarded with every
/// prompt. The value is never inspected.
#[async_trait]
pub trait SceneContextSource {
    async fn snapshot(&self) -> Result<Value>;
}

pub type SceneContextBox = Box<dyn SceneContextSource + Send + Sync>;
