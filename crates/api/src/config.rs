use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Longest accepted retention window (about a century).
const MAX_RETENTION_DAYS: i64 = 36_500;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for a single-host deployment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3030`).
    pub port: u16,
    /// SQLite database URL (default: `sqlite://dashboard.db`).
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long samples are kept (default: 7 days).
    pub metrics_retention_days: i64,
    /// Interval between retention sweeps in seconds (default: `3600`).
    pub metrics_cleanup_interval_secs: u64,
    /// Script catalog document (default: `scripts_config.json`).
    pub scripts_config_path: PathBuf,
    /// Per-command timeout for script runs in seconds (default: `60`).
    pub script_command_timeout_secs: u64,
    /// Optional password injected into `ssh` commands through `sshpass`.
    pub ssh_password: Option<String>,
    /// Per-subscriber live event queue size (default: `256`).
    pub event_buffer_size: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                  |
    /// |---------------------------------|--------------------------|
    /// | `HOST`                          | `0.0.0.0`                |
    /// | `PORT`                          | `3030`                   |
    /// | `DATABASE_URL`                  | `sqlite://dashboard.db`  |
    /// | `CORS_ORIGINS`                  | (any origin)             |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                     |
    /// | `METRICS_RETENTION_DAYS`        | `7`                      |
    /// | `METRICS_CLEANUP_INTERVAL_SECS` | `3600`                   |
    /// | `SCRIPTS_CONFIG_PATH`           | `scripts_config.json`    |
    /// | `SCRIPT_COMMAND_TIMEOUT_SECS`   | `60`                     |
    /// | `SSH_PASSWORD`                  | (unset)                  |
    /// | `EVENT_BUFFER_SIZE`             | `256`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&lookup, "PORT", 3030u16)?;
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://dashboard.db".into());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = positive(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let metrics_retention_days = positive(&lookup, "METRICS_RETENTION_DAYS", 7i64)?;
        if metrics_retention_days > MAX_RETENTION_DAYS {
            return Err(ConfigError::Invalid {
                var: "METRICS_RETENTION_DAYS",
                value: metrics_retention_days.to_string(),
                reason: format!("must be at most {MAX_RETENTION_DAYS}"),
            });
        }
        let metrics_cleanup_interval_secs =
            positive(&lookup, "METRICS_CLEANUP_INTERVAL_SECS", 3600u64)?;
        let scripts_config_path = lookup("SCRIPTS_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("scripts_config.json"));
        let script_command_timeout_secs =
            positive(&lookup, "SCRIPT_COMMAND_TIMEOUT_SECS", 60u64)?;
        let ssh_password = lookup("SSH_PASSWORD").filter(|p| !p.is_empty());
        let event_buffer_size = positive(&lookup, "EVENT_BUFFER_SIZE", 256usize)?;

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            metrics_retention_days,
            metrics_cleanup_interval_secs,
            scripts_config_path,
            script_command_timeout_secs,
            ssh_password,
            event_buffer_size,
        })
    }

    pub fn metrics_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.metrics_retention_days)
    }

    pub fn metrics_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_cleanup_interval_secs)
    }

    pub fn script_command_timeout(&self) -> Duration {
        Duration::from_secs(self.script_command_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let value = parse_var(lookup, var, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
