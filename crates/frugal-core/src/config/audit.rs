//! Audit trail configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the action audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit events are emitted at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Print one human-readable line per event.
    #[serde(default)]
    pub stdout: bool,

    /// Append events as JSON Lines to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stdout: false,
            file: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}
