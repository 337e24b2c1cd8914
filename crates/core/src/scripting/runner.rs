//! Sequential command runner with per-command timeouts.
//!
//! [`CommandRunner::run`] executes a script's commands strictly in order.
//! A failing or timed-out command is reported and the sequence carries on;
//! the caller learns about every step through the synchronous event
//! callback and gets an overall [`RunOutcome`] at the end. No retries are
//! attempted here.

use std::sync::Arc;
use std::time::Duration;

use super::executor::{CommandError, CommandExecutor, ShellExecutor};
use super::wrap::CommandWrapper;

/// How a single command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandExit {
    /// Process exit code (`-1` when killed by a signal or never spawned).
    Code(i32),
    /// Killed after exceeding the per-command timeout.
    TimedOut,
}

/// Outcome of one executed command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The command line as executed (after wrapping).
    pub command: String,
    pub exit: CommandExit,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        self.exit == CommandExit::Code(0)
    }
}

/// Step notifications emitted while a sequence runs.
///
/// `index` is the zero-based position in the sequence and `command` is the
/// catalog template (unwrapped, so injected credentials never reach logs).
#[derive(Debug, Clone)]
pub enum CommandEvent {
    Executing {
        index: usize,
        command: String,
    },
    Completed {
        index: usize,
        command: String,
        result: CommandResult,
    },
    Failed {
        index: usize,
        command: String,
        result: CommandResult,
    },
    TimedOut {
        index: usize,
        command: String,
        result: CommandResult,
    },
}

impl CommandEvent {
    pub fn index(&self) -> usize {
        match self {
            Self::Executing { index, .. }
            | Self::Completed { index, .. }
            | Self::Failed { index, .. }
            | Self::TimedOut { index, .. } => *index,
        }
    }

    /// The result carried by a terminal step event.
    pub fn result(&self) -> Option<&CommandResult> {
        match self {
            Self::Executing { .. } => None,
            Self::Completed { result, .. }
            | Self::Failed { result, .. }
            | Self::TimedOut { result, .. } => Some(result),
        }
    }

    /// Operator-facing log line for this event.
    pub fn log_message(&self) -> String {
        match self {
            Self::Executing { command, .. } => format!("Executing: {command}"),
            Self::Completed { result, .. } => {
                let mut msg = "✓ Command completed successfully".to_string();
                let stdout = result.stdout.trim();
                if !stdout.is_empty() {
                    msg.push_str("\nOutput: ");
                    msg.push_str(stdout);
                }
                msg
            }
            Self::Failed { result, .. } => {
                let code = match result.exit {
                    CommandExit::Code(code) => code,
                    CommandExit::TimedOut => -1,
                };
                let mut msg = format!("✗ Command failed (exit code: {code})");
                let stderr = result.stderr.trim();
                if !stderr.is_empty() {
                    msg.push_str("\nError: ");
                    msg.push_str(stderr);
                }
                msg
            }
            Self::TimedOut { result, .. } => {
                format!("✗ Command timed out after {}ms", result.duration_ms)
            }
        }
    }
}

/// Overall result of a command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every command exited with code 0.
    Success,
    /// At least one command failed or timed out.
    PartialFailure,
}

/// Runs command sequences one command at a time.
pub struct CommandRunner<E = ShellExecutor> {
    executor: E,
    wrapper: Arc<dyn CommandWrapper>,
}

impl CommandRunner<ShellExecutor> {
    /// Runner spawning commands through `sh -c`.
    pub fn shell(wrapper: Arc<dyn CommandWrapper>) -> Self {
        Self::new(ShellExecutor, wrapper)
    }
}

impl<E: CommandExecutor> CommandRunner<E> {
    pub fn new(executor: E, wrapper: Arc<dyn CommandWrapper>) -> Self {
        Self { executor, wrapper }
    }

    /// Execute `commands` in order.
    ///
    /// `on_event` is invoked synchronously with an `Executing` event before
    /// each command and a terminal event after it, so all events of command
    /// N are delivered before command N+1 starts.
    pub async fn run<F>(
        &self,
        commands: &[String],
        per_command_timeout: Duration,
        mut on_event: F,
    ) -> RunOutcome
    where
        F: FnMut(CommandEvent) + Send,
    {
        let mut all_succeeded = true;

        for (index, template) in commands.iter().enumerate() {
            on_event(CommandEvent::Executing {
                index,
                command: template.clone(),
            });

            let wrapped = self.wrapper.wrap(template);
            let event = match self.executor.execute(&wrapped, per_command_timeout).await {
                Ok(output) => {
                    let result = CommandResult {
                        command: wrapped,
                        exit: CommandExit::Code(output.exit_code),
                        stdout: output.stdout,
                        stderr: output.stderr,
                        duration_ms: output.duration_ms,
                    };
                    if result.succeeded() {
                        CommandEvent::Completed {
                            index,
                            command: template.clone(),
                            result,
                        }
                    } else {
                        CommandEvent::Failed {
                            index,
                            command: template.clone(),
                            result,
                        }
                    }
                }
                Err(CommandError::Timeout { elapsed_ms }) => CommandEvent::TimedOut {
                    index,
                    command: template.clone(),
                    result: CommandResult {
                        command: wrapped,
                        exit: CommandExit::TimedOut,
                        stdout: String::new(),
                        stderr: String::new(),
                        duration_ms: elapsed_ms,
                    },
                },
                Err(CommandError::Io(e)) => {
                    tracing::error!(index, error = %e, "Failed to spawn command");
                    CommandEvent::Failed {
                        index,
                        command: template.clone(),
                        result: CommandResult {
                            command: wrapped,
                            exit: CommandExit::Code(-1),
                            stdout: String::new(),
                            stderr: e.to_string(),
                            duration_ms: 0,
                        },
                    }
                }
            };

            if !matches!(event, CommandEvent::Completed { .. }) {
                all_succeeded = false;
            }
            on_event(event);
        }

        if all_succeeded {
            RunOutcome::Success
        } else {
            RunOutcome::PartialFailure
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
