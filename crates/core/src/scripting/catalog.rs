//! Script catalog: the declarative set of runnable scripts.
//!
//! The catalog document is a JSON object keyed by script id:
//!
//! ```json
//! {
//!   "restart_llama": {
//!     "name": "Restart llama-server",
//!     "description": "Restart the inference service on the GPU box",
//!     "commands": ["ssh ops@gpu-box \"sudo systemctl restart llama\""]
//!   }
//! }
//! ```
//!
//! Parsing is all-or-nothing: a document with any malformed entry yields an
//! error and no catalog, so a failed reload can never leave a half-updated
//! catalog behind.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Errors raised while loading a catalog document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read script catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid script catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid script '{id}': {reason}")]
    InvalidScript { id: String, reason: String },
}

/// One named script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub commands: Vec<String>,
}

/// Public view of a script (commands are never exposed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptSummary {
    pub name: String,
    pub description: String,
}

/// Parsed catalog, keyed by script id in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptCatalog {
    scripts: IndexMap<String, ScriptDefinition>,
}

impl ScriptCatalog {
    /// Build a catalog from already-validated definitions.
    pub fn new(scripts: IndexMap<String, ScriptDefinition>) -> Self {
        Self { scripts }
    }

    /// Parse a catalog document.
    pub fn parse(document: &str) -> Result<Self, CatalogError> {
        let scripts: IndexMap<String, ScriptDefinition> = serde_json::from_str(document)?;

        for (id, script) in &scripts {
            if id.trim().is_empty() {
                return Err(CatalogError::InvalidScript {
                    id: id.clone(),
                    reason: "script id must not be empty".to_string(),
                });
            }
            if script.name.trim().is_empty() {
                return Err(CatalogError::InvalidScript {
                    id: id.clone(),
                    reason: "name must not be empty".to_string(),
                });
            }
            if script.commands.iter().any(|c| c.trim().is_empty()) {
                return Err(CatalogError::InvalidScript {
                    id: id.clone(),
                    reason: "commands must not contain blank entries".to_string(),
                });
            }
        }

        Ok(Self { scripts })
    }

    /// Read and parse the catalog file at `path`.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let document = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse(&document)
    }

    /// Startup variant of [`load`](Self::load): a missing or invalid file
    /// yields an empty catalog and a logged warning.
    pub async fn load_or_empty(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(catalog) => {
                tracing::info!(path = %path.display(), scripts = catalog.len(), "Loaded script catalog");
                catalog
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Script catalog unavailable, starting empty");
                Self::default()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ScriptDefinition> {
        self.scripts.get(id)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Name and description of every script, in document order.
    pub fn summaries(&self) -> IndexMap<String, ScriptSummary> {
        self.scripts
            .iter()
            .map(|(id, script)| {
                (
                    id.clone(),
                    ScriptSummary {
                        name: script.name.clone(),
                        description: script.description.clone(),
                    },
                )
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
