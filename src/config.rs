use crate::logging::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How output registrations reach the scope table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Each output is registered right after it is allocated. A later
    /// failure in the same op leaves earlier outputs registered.
    #[default]
    Incremental,
    /// Outputs are buffered and registered only once the node is accepted.
    Transactional,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub graph_name: String,
    pub min_severity: Severity,
    pub commit_mode: CommitMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            graph_name: "main".to_string(),
            min_severity: Severity::Warning,
            commit_mode: CommitMode::Incremental,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        Self::from_json(&content)
    }
}
