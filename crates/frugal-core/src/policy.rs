//! Policy model.
//!
//! A policy pairs a resource kind with match predicates and an ordered list of
//! remediation actions:
//!
//! ```yaml
//! - name: stop-idle-vms
//!   resource: azure.vm
//!   enabled: true
//!   filters:
//!     - type: last_used
//!       days: 7
//!       threshold: 5
//!   exclusions:
//!     - type: tag
//!       key: environment
//!       value: production
//!   actions:
//!     - type: stop
//! ```
//!
//! Filters combine with AND semantics, exclusions with OR semantics. Actions
//! are applied in list order; later actions see the state left by earlier ones.

use crate::resource::{Capability, ResourceKind};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named policy, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique within a run.
    pub name: String,

    /// Kind of resource this policy enumerates.
    #[serde(alias = "resource")]
    pub resource_type: ResourceKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Every filter must hold for a resource to match.
    #[serde(default)]
    pub filters: Vec<Filter>,

    /// A resource matching any exclusion is skipped.
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,

    /// Applied in order to each matched resource.
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Policies are opt-in.
    #[serde(default)]
    pub enabled: bool,
}

impl Policy {
    /// Action names joined for reporting, e.g. `"stop, delete"`.
    pub fn actions_joined(&self) -> String {
        self.actions
            .iter()
            .map(|a| a.kind().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A match predicate, used both as a filter and as an exclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Mean utilization over the trailing `days` is below `cpu_threshold`.
    LastUsed {
        days: u32,
        #[serde(default = "default_cpu_threshold", alias = "threshold")]
        cpu_threshold: f64,
    },
    /// Not attached to anything that would keep it in use.
    Unattached,
    /// Tag `key` equals `value`.
    Tag { key: String, value: String },
    /// SKU name is one of the allowed values.
    Sku {
        #[serde(alias = "values")]
        allowed_values: Vec<String>,
    },
    /// Provider reports the resource as deallocated.
    Stopped,
    /// Application gateway without backend pools, or with an empty pool.
    EmptyBackendPool,
}

impl Predicate {
    pub fn name(&self) -> &'static str {
        match self {
            Predicate::LastUsed { .. } => "last_used",
            Predicate::Unattached => "unattached",
            Predicate::Tag { .. } => "tag",
            Predicate::Sku { .. } => "sku",
            Predicate::Stopped => "stopped",
            Predicate::EmptyBackendPool => "empty_backend_pool",
        }
    }
}

pub type Filter = Predicate;
pub type Exclusion = Predicate;

/// A remediation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Stop (deallocate) the resource.
    Stop,
    /// Delete the resource and wait for the operation to finish.
    Delete,
    /// Move the resource to the given SKU.
    UpdateSku { sku: String },
    /// Move the resource (or a VM's attached disks) to a cheaper SKU.
    #[serde(alias = "downgrade_disks")]
    Downgrade {
        #[serde(default = "default_downgrade_sku")]
        sku: String,
    },
    /// Rescale capacity by time of day according to the first matching tier.
    #[serde(alias = "scale_sql_database")]
    ScaleCapacity { tiers: Vec<Tier> },
    /// Record the match without mutating anything.
    Log,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Stop => ActionKind::Stop,
            Action::Delete => ActionKind::Delete,
            Action::UpdateSku { .. } => ActionKind::UpdateSku,
            Action::Downgrade { .. } => ActionKind::Downgrade,
            Action::ScaleCapacity { .. } => ActionKind::ScaleCapacity,
            Action::Log => ActionKind::Log,
        }
    }

    /// The capability a resource kind must have for this action to apply.
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Action::Stop => Some(Capability::Stop),
            Action::Delete => Some(Capability::Delete),
            Action::UpdateSku { .. } => Some(Capability::AdjustSku),
            Action::Downgrade { .. } => Some(Capability::Downgrade),
            Action::ScaleCapacity { .. } => Some(Capability::ScaleCapacity),
            Action::Log => None,
        }
    }
}

/// Discriminant of [`Action`], used in status entries and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Stop,
    Delete,
    UpdateSku,
    Downgrade,
    ScaleCapacity,
    Log,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Stop => "stop",
            ActionKind::Delete => "delete",
            ActionKind::UpdateSku => "update_sku",
            ActionKind::Downgrade => "downgrade",
            ActionKind::ScaleCapacity => "scale_capacity",
            ActionKind::Log => "log",
        };
        f.write_str(s)
    }
}

/// A capacity tier for time-of-day scaling.
///
/// Matched against a resource's SKU name by substring containment; the first
/// matching tier in the list wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,

    /// Local time the off-peak window opens (`HH:MM`).
    #[serde(with = "hhmm")]
    pub off_peak_start: NaiveTime,

    /// Local time the off-peak window closes (`HH:MM`), exclusive.
    #[serde(with = "hhmm")]
    pub off_peak_end: NaiveTime,

    #[serde(alias = "off_peak_dtu")]
    pub off_peak_capacity: u32,

    #[serde(alias = "peak_dtu")]
    pub peak_capacity: u32,

    #[serde(alias = "min_dtu")]
    pub min_capacity: u32,

    #[serde(alias = "max_dtu")]
    pub max_capacity: u32,
}

impl Tier {
    /// Whether this tier applies to the given SKU name.
    pub fn matches_sku(&self, sku_name: &str) -> bool {
        sku_name.contains(self.name.as_str())
    }

    /// Clamp a capacity into `[min_capacity, max_capacity]`.
    pub fn clamp(&self, capacity: u32) -> u32 {
        capacity.max(self.min_capacity).min(self.max_capacity)
    }
}

fn default_cpu_threshold() -> f64 {
    10.0
}

fn default_downgrade_sku() -> String {
    "Standard_LRS".to_string()
}

/// `HH:MM` (de)serialization for [`NaiveTime`].
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_field_spellings() {
        let yaml = r#"
name: scale-sql
resource: azure.sql
enabled: true
actions:
  - type: scale_sql_database
    tiers:
      - name: Standard
        off_peak_start: "22:00"
        off_peak_end: "06:00"
        off_peak_dtu: 10
        peak_dtu: 50
        min_dtu: 10
        max_dtu: 100
"#;
        let policy: Policy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.resource_type, ResourceKind::SqlDatabase);
        let Action::ScaleCapacity { tiers } = &policy.actions[0] else {
            panic!("expected scale_capacity action");
        };
        assert_eq!(tiers[0].off_peak_start, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert_eq!(tiers[0].peak_capacity, 50);
        assert!(policy.filters.is_empty());
        assert!(policy.exclusions.is_empty());
    }

    #[test]
    fn last_used_threshold_defaults_to_ten() {
        let filter: Predicate = serde_yaml::from_str("type: last_used\ndays: 14\n").unwrap();
        assert_eq!(
            filter,
            Predicate::LastUsed {
                days: 14,
                cpu_threshold: 10.0
            }
        );
    }

    #[test]
    fn sku_filter_accepts_values_alias() {
        let filter: Predicate =
            serde_yaml::from_str("type: sku\nvalues: [Premium_LRS, StandardSSD_LRS]\n").unwrap();
        assert_eq!(filter.name(), "sku");
        match filter {
            Predicate::Sku { allowed_values } => assert_eq!(allowed_values.len(), 2),
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn downgrade_defaults_to_standard_lrs() {
        let action: Action = serde_yaml::from_str("type: downgrade_disks\n").unwrap();
        assert_eq!(
            action,
            Action::Downgrade {
                sku: "Standard_LRS".to_string()
            }
        );
        assert_eq!(action.required_capability(), Some(Capability::Downgrade));
    }

    #[test]
    fn rejects_malformed_tier_time() {
        let yaml = r#"
name: Basic
off_peak_start: "25:00"
off_peak_end: "06:00"
off_peak_capacity: 5
peak_capacity: 5
min_capacity: 5
max_capacity: 5
"#;
        let err = serde_yaml::from_str::<Tier>(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid time"));
    }

    #[test]
    fn tier_clamps_into_bounds() {
        let tier = Tier {
            name: "Standard".to_string(),
            off_peak_start: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            off_peak_end: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            off_peak_capacity: 5,
            peak_capacity: 400,
            min_capacity: 10,
            max_capacity: 200,
        };
        assert_eq!(tier.clamp(5), 10);
        assert_eq!(tier.clamp(400), 200);
        assert_eq!(tier.clamp(50), 50);
        assert!(tier.matches_sku("Standard_S2"));
        assert!(!tier.matches_sku("Premium_P1"));
    }

    #[test]
    fn actions_joined_preserves_order() {
        let policy = Policy {
            name: "p".to_string(),
            resource_type: ResourceKind::Vm,
            description: None,
            filters: vec![],
            exclusions: vec![],
            actions: vec![Action::Stop, Action::Log],
            enabled: true,
        };
        assert_eq!(policy.actions_joined(), "stop, log");
    }
}
