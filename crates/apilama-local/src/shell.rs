//! Shell command execution

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use apilama_core::{Arguments, CapabilityKind, Operation, Payload};
use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::args;
use crate::error::{LocalError, LocalResult};
use crate::files::into_payload;
use crate::sandbox::{metadata_if_exists, resolve};
use crate::service::LocalService;

pub use apilama_core::DEFAULT_COMMAND_TIMEOUT;

/// Captured result of a finished command
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Runs commands through `sh -c` inside a working directory
#[derive(Debug, Clone)]
pub struct ShellService {
    work_dir: PathBuf,
    default_timeout: Duration,
}

impl ShellService {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            default_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Run `command`. A non-zero exit status is reported, not raised.
    pub async fn execute(
        &self,
        command: &str,
        cwd: Option<&str>,
        timeout: Option<Duration>,
    ) -> LocalResult<CommandOutput> {
        let dir = match cwd {
            Some(rel) if !rel.is_empty() => resolve(&self.work_dir, rel)?,
            _ => self.work_dir.clone(),
        };
        match metadata_if_exists(&dir).await? {
            Some(meta) if meta.is_dir() => {}
            _ => {
                return Err(LocalError::NotFound(format!(
                    "Working directory {}",
                    dir.display()
                )))
            }
        }

        let timeout = timeout.unwrap_or(self.default_timeout);
        tracing::info!(
            command = %command,
            cwd = %dir.display(),
            timeout_ms = timeout.as_millis() as u64,
            "Executing command"
        );

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| LocalError::Timeout(timeout))?
            .map_err(|e| LocalError::Spawn(e.to_string()))?;

        let result = CommandOutput {
            command: command.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            success: output.status.success(),
        };

        if !result.success {
            tracing::debug!(
                command = %command,
                exit_code = ?result.exit_code,
                "Command exited unsuccessfully"
            );
        }
        Ok(result)
    }
}

#[async_trait]
impl LocalService for ShellService {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Shell
    }

    async fn self_test(&self) -> bool {
        matches!(metadata_if_exists(&self.work_dir).await, Ok(Some(meta)) if meta.is_dir())
    }

    async fn call(&self, operation: Operation, arguments: &Arguments) -> LocalResult<Payload> {
        if operation != Operation::ExecuteCommand {
            return Err(LocalError::Unsupported {
                capability: self.kind().to_string(),
                operation: operation.to_string(),
            });
        }

        let command = args::required_str(arguments, "command")?;
        let cwd = args::optional_str(arguments, "cwd")?;
        let timeout = args::optional_u64(arguments, "timeout_ms")?.map(Duration::from_millis);

        let output = self.execute(command, cwd, timeout).await?;
        let value = serde_json::to_value(output)
            .map_err(|e| LocalError::Spawn(format!("Failed to encode command output: {}", e)))?;
        Ok(into_payload(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let shell = ShellService::new(dir.path());

        let out = shell.execute("echo hello", None, None).await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.exit_code, Some(0));
        assert!(out.success);

        let out = shell.execute("echo oops >&2; exit 3", None, None).await.unwrap();
        assert_eq!(out.stderr.trim(), "oops");
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success);
    }

    #[tokio::test]
    async fn test_runs_in_relative_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/marker"), "").unwrap();

        let out = ShellService::new(dir.path())
            .execute("ls", Some("sub"), None)
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "marker");
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = TempDir::new().unwrap();
        let err = ShellService::new(dir.path())
            .execute("sleep 5", None, Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_cwd_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ShellService::new(dir.path())
            .execute("true", Some("nope"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LocalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_call_parses_timeout_argument() {
        let dir = TempDir::new().unwrap();
        let args = into_payload(json!({"command": "printf hi", "timeout_ms": "5000"}));
        let payload = ShellService::new(dir.path())
            .call(Operation::ExecuteCommand, &args)
            .await
            .unwrap();
        assert_eq!(payload["stdout"], "hi");
        assert_eq!(payload["success"], true);
    }
}
