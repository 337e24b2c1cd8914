#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Another script is already running")]
    AlreadyRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}
