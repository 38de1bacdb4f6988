//! End-of-run report.

use crate::analytics::{CostAnalysis, CostSummary};
use chrono::{DateTime, Utc};
use frugal_core::{ActionStatus, ImpactRecord, NonImpactRecord, RunMode, StatusLogEntry};
use serde::{Deserialize, Serialize};

/// Cost data collected for one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeCost {
    pub scope: String,
    pub summary: CostSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CostAnalysis>,
}

/// A scope that could not be processed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFailure {
    pub scope: String,
    pub error: String,
}

/// Aggregate of a whole run, produced even when individual actions failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Scopes that were processed, in order.
    pub scopes: Vec<String>,
    pub status_log: Vec<StatusLogEntry>,
    pub impacted: Vec<ImpactRecord>,
    pub non_impacted: Vec<NonImpactRecord>,
    #[serde(default)]
    pub costs: Vec<ScopeCost>,
    #[serde(default)]
    pub failed_scopes: Vec<ScopeFailure>,
    /// The run stopped early on request.
    pub cancelled: bool,
}

impl RunReport {
    pub fn new(mode: RunMode, started_at: DateTime<Utc>) -> Self {
        Self {
            mode,
            started_at,
            finished_at: started_at,
            scopes: Vec::new(),
            status_log: Vec::new(),
            impacted: Vec::new(),
            non_impacted: Vec::new(),
            costs: Vec::new(),
            failed_scopes: Vec::new(),
            cancelled: false,
        }
    }

    /// Number of entries with the given status.
    pub fn count(&self, status: ActionStatus) -> usize {
        self.status_log
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    /// Any action failed or was rejected, or a scope could not be processed.
    pub fn has_failures(&self) -> bool {
        !self.failed_scopes.is_empty()
            || self
                .status_log
                .iter()
                .any(|e| matches!(e.status, ActionStatus::Failed | ActionStatus::Error))
    }
}
