//! Single-command execution interface and shared types.
//!
//! Defines [`CommandExecutor`], the seam between the runner and the
//! process layer, along with [`CommandOutput`] and [`CommandError`].
//! [`ShellExecutor`] is the production implementation.

use std::time::Duration;

use serde::Serialize;

use super::subprocess;

/// Captured output from one finished command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    /// Stdout captured from the process (possibly truncated).
    pub stdout: String,
    /// Stderr captured from the process (possibly truncated).
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Errors that keep a command from producing a [`CommandOutput`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The command exceeded its timeout and was killed.
    #[error("Command timed out after {elapsed_ms}ms")]
    Timeout {
        /// Elapsed wall-clock time before the process was killed.
        elapsed_ms: u64,
    },

    /// Spawning or waiting on the process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs one fully wrapped command line.
pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        command: &str,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<CommandOutput, CommandError>> + Send;
}

/// Executes command lines through `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<CommandOutput, CommandError> {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c").arg(command);
        subprocess::run_command(&mut cmd, timeout).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
