//! Configuration types for Frugal.
//!
//! Configuration is loaded from a single YAML file (`frugal.yaml` by default).
//! Every section has defaults, so the smallest useful file only names the
//! policy file and an inventory snapshot:
//!
//! ```yaml
//! policies:
//!   policy_file: policies.yaml
//! scope:
//!   id_env: AZURE_SUBSCRIPTION_ID
//! inventory:
//!   snapshot_file: inventory.yaml
//! ```
//!
//! Relative paths are resolved against the directory of the configuration file.

pub mod audit;
pub mod execution;
pub mod policies;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use audit::AuditConfig;
pub use execution::{ExecutionConfig, RetryConfig};
pub use policies::{PoliciesConfig, PolicyDocument, load_policies, parse_policies};

/// Complete Frugal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrugalConfig {
    /// Project name, used only for display.
    #[serde(default)]
    pub project: Option<String>,

    /// Where policies come from.
    #[serde(default)]
    pub policies: PoliciesConfig,

    /// Which account scopes to govern.
    #[serde(default)]
    pub scope: ScopeConfig,

    /// Polling, timeouts and evaluation tuning.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Inventory snapshot used by the snapshot provider.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Audit trail of dispatched actions.
    #[serde(default)]
    pub audit: AuditConfig,

    /// End-of-run report output.
    #[serde(default)]
    pub report: ReportConfig,

    /// Cost summary collection.
    #[serde(default)]
    pub cost: CostConfig,
}

/// Account scope selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Default scope identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// Environment variable holding the default scope identifier.
    #[serde(default)]
    pub id_env: Option<String>,

    /// Scopes visited by an all-scopes run. Empty means every scope the
    /// provider can see.
    #[serde(default)]
    pub all: Vec<String>,
}

impl ScopeConfig {
    /// Resolve the default scope: explicit id first, then the environment.
    pub fn resolve(&self) -> Option<String> {
        if let Some(id) = self.id.as_ref().filter(|id| !id.is_empty()) {
            return Some(id.clone());
        }
        self.id_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// YAML or JSON inventory snapshot.
    #[serde(default)]
    pub snapshot_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write the end-of-run report as JSON to this file.
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    /// Collect a cost summary per scope.
    #[serde(default)]
    pub enabled: bool,

    /// Days of daily cost history to summarize.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lookback_days: default_lookback_days(),
        }
    }
}

fn default_lookback_days() -> u32 {
    30
}

/// Error type for configuration loading.
///
/// Every variant is fatal: a run aborts before any provider call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("policy file failed schema validation:\n  {}", .0.join("\n  "))]
    Schema(Vec<String>),

    #[error("missing required setting: {0}")]
    MissingSetting(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FrugalConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_file(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve relative paths against the file's directory.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        config.resolve_paths(&base_dir);
        Ok(config)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p.as_mut() {
                if path.is_relative() {
                    *path = base_dir.join(&*path);
                }
            }
        };
        resolve(&mut self.policies.policy_file);
        resolve(&mut self.policies.schema_file);
        resolve(&mut self.inventory.snapshot_file);
        resolve(&mut self.audit.file);
        resolve(&mut self.report.output_file);
    }

    /// The policy file, which every run needs.
    pub fn require_policy_file(&self) -> Result<&Path, ConfigError> {
        self.policies
            .policy_file
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSetting("policies.policy_file".to_string()))
    }

    /// The inventory snapshot backing the snapshot provider.
    pub fn require_snapshot_file(&self) -> Result<&Path, ConfigError> {
        self.inventory
            .snapshot_file
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSetting("inventory.snapshot_file".to_string()))
    }

    /// The default scope, from the configuration or its environment variable.
    pub fn require_scope(&self) -> Result<String, ConfigError> {
        self.scope.resolve().ok_or_else(|| {
            let hint = match &self.scope.id_env {
                Some(var) => format!("scope.id (or environment variable {})", var),
                None => "scope.id".to_string(),
            };
            ConfigError::MissingSetting(hint)
        })
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
