//! Frugal core types.
//!
//! Shared across every Frugal crate:
//! - the policy model (policies, predicates, actions, capacity tiers)
//! - the resource model exposed by resource providers
//! - the status log and impact records produced by a run
//! - configuration and policy-file loading

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod clock;
pub mod config;
pub mod policy;
pub mod resource;
pub mod status;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    AuditConfig, ConfigError, CostConfig, ExecutionConfig, FrugalConfig, InventoryConfig,
    PoliciesConfig, ReportConfig, RetryConfig, ScopeConfig,
};
pub use policy::{Action, ActionKind, Exclusion, Filter, Policy, Predicate, Tier};
pub use resource::{
    Attachment, BackendPool, Capability, PowerState, Resource, ResourceKind, Sku,
    UtilizationSample,
};
pub use status::{ActionStatus, ImpactRecord, NonImpactRecord, StatusLogEntry};

/// Execution mode of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Evaluate and report, never mutate.
    DryRun,
    /// Evaluate and dispatch mutating actions.
    Apply,
}

impl RunMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, RunMode::DryRun)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::DryRun => write!(f, "dry-run"),
            RunMode::Apply => write!(f, "apply"),
        }
    }
}
