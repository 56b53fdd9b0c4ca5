#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod clipboard;
pub mod command;
pub mod noop;

use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ExecutorBox;
use crate::domain::models::ExecutorName;

pub struct ExecutorManager {}

impl ExecutorManager {
    pub fn get(name: ExecutorName, config: &Config) -> Result<ExecutorBox> {
        match name {
            ExecutorName::None => return Ok(Box::<noop::NoopExecutor>::default()),
            ExecutorName::Clipboard => return Ok(Box::<clipboard::ClipboardExecutor>::default()),
            ExecutorName::Command => {
                let executor = command::CommandExecutor::new(&config.get(ConfigKey::ExecCommand))?;
                return Ok(Box::new(executor));
            }
        }
    }
}
