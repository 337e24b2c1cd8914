//! Per-command wrapping for the execution environment.
//!
//! Catalog commands are written as plain shell lines. Before a command is
//! spawned, a [`CommandWrapper`] may rewrite it; the `ssh` wrapper injects
//! host-key options and, when configured, password authentication through
//! `sshpass`. Wrappers are pure string transforms.

use std::path::Path;

/// Rewrites a command template into the string actually executed.
pub trait CommandWrapper: Send + Sync {
    fn wrap(&self, command: &str) -> String;
}

/// Identity wrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughWrapper;

impl CommandWrapper for PassthroughWrapper {
    fn wrap(&self, command: &str) -> String {
        command.to_string()
    }
}

/// Wrapper for `ssh user@host "<remote command>"` lines.
#[derive(Clone, Default)]
pub struct SshCommandWrapper {
    password: Option<String>,
    has_sshpass: bool,
}

impl std::fmt::Debug for SshCommandWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshCommandWrapper")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("has_sshpass", &self.has_sshpass)
            .finish()
    }
}

impl SshCommandWrapper {
    pub fn new(password: Option<String>, has_sshpass: bool) -> Self {
        let password = password.filter(|p| !p.is_empty());
        Self {
            password,
            has_sshpass,
        }
    }

    /// Build a wrapper, probing `PATH` for `sshpass` and logging which
    /// authentication mode is in effect.
    pub fn detect(password: Option<String>) -> Self {
        let has_sshpass = find_on_path("sshpass");
        let wrapper = Self::new(password, has_sshpass);

        match (wrapper.has_sshpass, wrapper.password.is_some()) {
            (true, true) => tracing::info!("SSH password authentication enabled"),
            (false, true) => tracing::warn!(
                "SSH password is set but sshpass was not found on PATH; falling back to key-based SSH"
            ),
            (_, false) => tracing::info!("SSH password not configured; using key-based SSH"),
        }

        wrapper
    }

    fn uses_password(&self) -> bool {
        self.has_sshpass && self.password.is_some()
    }
}

impl CommandWrapper for SshCommandWrapper {
    fn wrap(&self, command: &str) -> String {
        if !command.trim_start().starts_with("ssh ") {
            return command.to_string();
        }

        // ssh, user@host, remote command (quoted, may contain spaces).
        let mut parts = command.trim_start().splitn(3, ' ');
        let (Some(ssh), Some(target), Some(remote)) = (parts.next(), parts.next(), parts.next())
        else {
            return command.to_string();
        };

        let base = format!("{ssh} -o StrictHostKeyChecking=no {target} {remote}");
        match (&self.password, self.uses_password()) {
            (Some(password), true) => format!("sshpass -p {} {base}", shell_quote(password)),
            _ => base,
        }
    }
}

/// Single-quote `value` so the shell treats every character literally.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn find_on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| is_file(&dir.join(program))))
        .unwrap_or(false)
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
