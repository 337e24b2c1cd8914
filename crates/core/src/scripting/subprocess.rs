//! Subprocess spawn, capture, and timeout handling.
//!
//! [`run_command`] is the process-level half of
//! [`ShellExecutor`](crate::scripting::executor::ShellExecutor). The caller
//! builds the [`Command`]; this module wires the pipes, enforces the
//! timeout and collects output.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::executor::{CommandError, CommandOutput};

/// Maximum stdout or stderr size captured per stream (1 MiB).
///
/// Remote commands stream into the dashboard log, so anything beyond this
/// is dropped.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Spawn `cmd`, capture stdout/stderr, and kill it if it runs longer than
/// `timeout`.
///
/// Stdin is closed so interactive prompts (e.g. an `ssh` password prompt)
/// fail fast instead of hanging until the timeout.
pub async fn run_command(cmd: &mut Command, timeout: Duration) -> Result<CommandOutput, CommandError> {
    // `kill_on_drop(true)` ensures the child is killed when dropped (e.g. on timeout).
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn()?;

    // Read the pipes in spawned tasks so `child.wait()` can borrow `&mut child`.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let mut stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let mut stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    // The deadline covers draining the pipes too: a backgrounded grandchild
    // (`nohup server &`) keeps them open after the shell itself exits.
    let collected = tokio::time::timeout(timeout, async {
        let status = child.wait().await?;
        let (stdout, stderr) = tokio::join!(&mut stdout_task, &mut stderr_task);
        Ok::<_, std::io::Error>((status, stdout.unwrap_or_default(), stderr.unwrap_or_default()))
    })
    .await;

    match collected {
        Ok(Ok((status, stdout_bytes, stderr_bytes))) => Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            exit_code: status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        }),
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            Err(CommandError::Io(e))
        }
        Err(_elapsed) => {
            // `child` is dropped on return, which kills the shell if it is
            // still alive. Grandchildren holding the pipes are left alone.
            stdout_task.abort();
            stderr_task.abort();
            Err(CommandError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
