//! Status log and impact records.
//!
//! A status log entry is appended exactly once per action attempt and never
//! mutated afterwards. Impact records and non-impact markers summarize which
//! policies touched which resources.

use crate::policy::ActionKind;
use crate::resource::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single action attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    Success,
    Failed,
    #[serde(rename = "No Change")]
    NoChange,
    #[serde(rename = "Dry Run")]
    DryRun,
    #[serde(rename = "No Action")]
    NoAction,
    /// The requested target state is invalid; retrying cannot succeed.
    Error,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionStatus::Success => "Success",
            ActionStatus::Failed => "Failed",
            ActionStatus::NoChange => "No Change",
            ActionStatus::DryRun => "Dry Run",
            ActionStatus::NoAction => "No Action",
            ActionStatus::Error => "Error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    /// Account scope the resource lives in.
    pub scope: String,
    pub resource_name: String,
    pub action: ActionKind,
    pub status: ActionStatus,
    pub message: String,
}

impl StatusLogEntry {
    pub fn new(
        scope: impl Into<String>,
        resource_name: impl Into<String>,
        action: ActionKind,
        status: ActionStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            resource_name: resource_name.into(),
            action,
            status,
            message: message.into(),
        }
    }
}

/// A policy matched a resource and changed (or would change) it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub scope: String,
    pub policy_name: String,
    pub resource_name: String,
    /// Action names in dispatch order, comma separated.
    pub actions: String,
}

/// A policy impacted no resource in a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonImpactRecord {
    pub scope: String,
    pub policy_name: String,
    pub resource_type: ResourceKind,
    /// Why nothing was impacted, when it was not simply "no match".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_report_spelling() {
        assert_eq!(
            serde_json::to_string(&ActionStatus::DryRun).unwrap(),
            "\"Dry Run\""
        );
        assert_eq!(ActionStatus::NoChange.to_string(), "No Change");
        assert_eq!(ActionStatus::NoAction.to_string(), "No Action");
    }
}
