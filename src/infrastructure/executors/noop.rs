#[cfg(test)]
#[path = "noop_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Executor;
use crate::domain::models::ExecutorName;

#[derive(Default)]
pub struct NoopExecutor {}

#[async_trait]
impl Executor for NoopExecutor {
    fn name(&self) -> ExecutorName {
        return ExecutorName::None;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn execute(&self, _code: &str) -> Result<String> {
        bail!("None executor does not support running code. Consider using the 'clipboard' or 'command' executor instead");
    }
}
