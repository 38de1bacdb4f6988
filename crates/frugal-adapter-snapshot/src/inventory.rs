//! Inventory snapshot file model.
//!
//! A snapshot lists, per account scope, the resources the provider would
//! report together with the live state normally read from monitoring APIs:
//!
//! ```yaml
//! scopes:
//!   - id: sub-dev
//!     resources:
//!       - id: /subscriptions/sub-dev/resourceGroups/rg-app/providers/Microsoft.Compute/virtualMachines/vm-1
//!         name: vm-1
//!         kind: vm
//!         group: rg-app
//!         power_state: deallocated
//!         utilization:
//!           Percentage CPU:
//!             - { timestamp: "2024-05-01T00:00:00Z", value: 1.5 }
//!     costs:
//!       - { date: "2024-05-01", cost: 41.2 }
//! ```

use anyhow::Context;
use chrono::NaiveDate;
use frugal_core::{PowerState, Resource, UtilizationSample};
use frugal_runtime::CostPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub scopes: Vec<ScopeSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceSnapshot>,

    /// Daily cost of the whole scope.
    #[serde(default)]
    pub costs: Vec<CostPoint>,

    /// Valid capacities per service tier, overriding the built-in table.
    #[serde(default)]
    pub capacities: BTreeMap<String, Vec<u32>>,
}

/// A resource plus the state a live provider would look up separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    #[serde(flatten)]
    pub resource: Resource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<PowerState>,

    /// Samples keyed by metric name.
    #[serde(default)]
    pub utilization: BTreeMap<String, Vec<UtilizationSample>>,

    /// Referenced by a load balancer or similar aggregator.
    #[serde(default)]
    pub referenced_by_aggregator: bool,

    /// Ids of managed disks attached to this resource.
    #[serde(default)]
    pub attached_disks: Vec<String>,

    /// Mutations against this resource are accepted but end in failure.
    #[serde(default)]
    pub locked: bool,
}

impl ResourceSnapshot {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            power_state: None,
            utilization: BTreeMap::new(),
            referenced_by_aggregator: false,
            attached_disks: Vec::new(),
            locked: false,
        }
    }
}

impl Inventory {
    /// Load a snapshot; `.json` files are read as JSON, anything else as YAML.
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read inventory snapshot {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let inventory = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", path.display()))?
        } else {
            Self::from_yaml(&content)
                .with_context(|| format!("invalid YAML in {}", path.display()))?
        };
        Ok(inventory)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn scope(&self, id: &str) -> Option<&ScopeSnapshot> {
        self.scopes.iter().find(|s| s.id == id)
    }
}

/// Valid DTU capacities per database service tier.
pub fn default_capacities(service_tier: &str) -> &'static [u32] {
    match service_tier {
        "Basic" => &[5],
        "Standard" => &[10, 20, 50, 100, 200, 400, 800, 1600, 3000],
        "Premium" => &[125, 250, 500, 1000, 1750, 4000],
        _ => &[],
    }
}

/// The last `days` points by date, oldest first.
pub(crate) fn trailing_costs(costs: &[CostPoint], days: u32) -> Vec<CostPoint> {
    let mut sorted = costs.to_vec();
    sorted.sort_by_key(|p| p.date);
    let Some(last) = sorted.last().map(|p| p.date) else {
        return sorted;
    };
    let first: NaiveDate = last - chrono::Duration::days(i64::from(days.saturating_sub(1)));
    sorted.retain(|p| p.date >= first);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use frugal_core::{Attachment, ResourceKind};

    const SNAPSHOT: &str = r#"
scopes:
  - id: sub-dev
    display_name: Development
    resources:
      - id: /sub-dev/rg-app/vm-1
        name: vm-1
        kind: azure.vm
        group: rg-app
        power_state: deallocated
        attached_disks: [/sub-dev/rg-app/disk-os]
        utilization:
          Percentage CPU:
            - { timestamp: "2024-05-01T00:00:00Z", value: 1.5 }
      - id: /sub-dev/rg-app/ip-1
        name: ip-1
        kind: public_ip
        attachment:
          type: public_ip
          ip_configuration: null
    costs:
      - { date: "2024-05-01", cost: 41.2 }
    capacities:
      Standard: [10, 20]
"#;

    #[test]
    fn parses_resources_with_live_state() {
        let inventory = Inventory::from_yaml(SNAPSHOT).unwrap();
        let scope = inventory.scope("sub-dev").unwrap();
        assert_eq!(scope.display_name.as_deref(), Some("Development"));
        assert_eq!(scope.resources.len(), 2);

        let vm = &scope.resources[0];
        assert_eq!(vm.resource.kind, ResourceKind::Vm);
        assert_eq!(vm.resource.group.as_deref(), Some("rg-app"));
        assert_eq!(vm.power_state, Some(PowerState::Deallocated));
        assert_eq!(vm.utilization["Percentage CPU"].len(), 1);
        assert_eq!(vm.attached_disks.len(), 1);
        assert!(!vm.locked);

        let ip = &scope.resources[1];
        assert_eq!(
            ip.resource.attachment,
            Attachment::PublicIp {
                ip_configuration: None
            }
        );
        assert_eq!(scope.capacities["Standard"], vec![10, 20]);
        assert!(inventory.scope("sub-prod").is_none());
    }

    #[tokio::test]
    async fn loads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        std::fs::write(
            &path,
            r#"{"scopes": [{"id": "s1", "resources": [{"id": "/d", "name": "d", "kind": "disk"}]}]}"#,
        )
        .unwrap();

        let inventory = Inventory::load(&path).await.unwrap();
        assert_eq!(inventory.scopes[0].resources[0].resource.kind, ResourceKind::Disk);
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let err = Inventory::load("/nonexistent/inventory.yaml").await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/inventory.yaml"));
    }

    #[test]
    fn dtu_table_matches_service_tiers() {
        assert_eq!(default_capacities("Basic"), &[5]);
        assert!(default_capacities("Standard").contains(&3000));
        assert!(default_capacities("Premium").contains(&1750));
        assert!(default_capacities("Hyperscale").is_empty());
    }

    #[test]
    fn trailing_costs_keeps_last_days() {
        let day = |d| CostPoint {
            date: NaiveDate::from_ymd_opt(2024, 5, d).unwrap(),
            cost: f64::from(d),
        };
        let costs = vec![day(5), day(1), day(3), day(4), day(2)];
        let last = trailing_costs(&costs, 3);
        let dates: Vec<u32> = last.iter().map(|p| p.cost as u32).collect();
        assert_eq!(dates, vec![3, 4, 5]);
        assert!(trailing_costs(&[], 3).is_empty());
    }
}
