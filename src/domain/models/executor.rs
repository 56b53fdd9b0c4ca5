use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExecutorName {
    None,
    Clipboard,
    Command,
}

impl ExecutorName {
    pub fn parse(text: &str) -> Option<ExecutorName> {
        return ExecutorName::iter().find(|e| return e.to_string() == text);
    }
}

#[async_trait]
pub trait Executor {
    fn name(&self) -> ExecutorName;

    /// Used at startup to verify the executor can run at all.
    async fn health_check(&self) -> Result<()>;

    /// Runs extracted code and returns what the collaborator reported back.
    async fn execute(&self, code: &str) -> Result<String>;
}

pub type ExecutorBox = Box<dyn Executor + Send + Sync>;
