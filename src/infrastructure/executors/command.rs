#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::models::Executor;
use crate::domain::models::ExecutorName;

/// Pipes code into an external command's stdin, e.g.
/// `blender --background --python-console`.
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(command: &str) -> Result<CommandExecutor> {
        let mut parts = command.split_whitespace().map(|e| return e.to_string());
        let program = match parts.next() {
            Some(program) => program,
            None => bail!("exec-command must be set to use the command executor"),
        };

        return Ok(CommandExecutor {
            program,
            args: parts.collect(),
        });
    }
}

/// The file `program` runs: itself when it carries a directory, otherwise the
/// first match on `PATH`.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }
        return None;
    }

    let paths = env::var_os("PATH")?;
    return env::split_paths(&paths)
        .map(|dir| return dir.join(program))
        .find(|e| return e.is_file());
}

#[async_trait]
impl Executor for CommandExecutor {
    fn name(&self) -> ExecutorName {
        return ExecutorName::Command;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if resolve_program(&self.program).is_none() {
            bail!(format!(
                "Command executor could not find '{}' on PATH",
                self.program
            ));
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn execute(&self, code: &str) -> Result<String> {
        tracing::debug!(program = self.program, args = ?self.args, "executing code");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                bail!(format!("Error executing code: {}", output.status));
            }
            bail!(format!("Error executing code: {stderr}"));
        }

        return Ok(String::from_utf8_lossy(&output.stdout).to_string());
    }
}
