//! Resource provider backed by an inventory snapshot.
//!
//! Each connected scope gets its own in-memory copy of the snapshot.
//! Mutations are applied to that copy and complete immediately, except on
//! resources marked `locked`, whose operations end in failure.
//! Utilization history is cut to the requested window relative to the
//! provider's clock.

use async_trait::async_trait;
use frugal_core::{
    Clock, PowerState, Resource, ResourceKind, Sku, SystemClock, UtilizationSample,
};
use frugal_policy::ResourceInspector;
use frugal_runtime::{
    CostPoint, Mutation, OperationHandle, OperationStatus, ProviderFactory, ResourceProvider,
    Scope,
};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

pub mod inventory;

pub use inventory::{Inventory, ResourceSnapshot, ScopeSnapshot, default_capacities};

/// Hands out one [`SnapshotProvider`] per scope listed in the snapshot.
#[derive(Clone)]
pub struct SnapshotProviderFactory {
    inventory: Inventory,
    clock: Arc<dyn Clock>,
}

impl SnapshotProviderFactory {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let inventory = Inventory::load(path).await?;
        tracing::info!(
            path = %path.display(),
            scopes = inventory.scopes.len(),
            "loaded inventory snapshot"
        );
        Ok(Self::new(inventory))
    }
}

#[async_trait]
impl ProviderFactory for SnapshotProviderFactory {
    async fn list_scopes(&self) -> anyhow::Result<Vec<Scope>> {
        Ok(self
            .inventory
            .scopes
            .iter()
            .map(|s| Scope {
                id: s.id.clone(),
                display_name: s.display_name.clone(),
            })
            .collect())
    }

    async fn connect(&self, scope: &str) -> anyhow::Result<Arc<dyn ResourceProvider>> {
        let snapshot = self
            .inventory
            .scope(scope)
            .ok_or_else(|| anyhow::anyhow!("scope '{}' is not in the inventory snapshot", scope))?;
        Ok(Arc::new(
            SnapshotProvider::new(snapshot.clone()).with_clock(self.clock.clone()),
        ))
    }
}

#[derive(Debug)]
struct State {
    resources: Vec<ResourceSnapshot>,
    operations: HashMap<String, OperationStatus>,
}

/// In-memory provider for a single scope.
pub struct SnapshotProvider {
    scope: String,
    costs: Vec<CostPoint>,
    capacities: BTreeMap<String, Vec<u32>>,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl SnapshotProvider {
    pub fn new(snapshot: ScopeSnapshot) -> Self {
        Self {
            scope: snapshot.id,
            costs: snapshot.costs,
            capacities: snapshot.capacities,
            clock: Arc::new(SystemClock),
            state: Mutex::new(State {
                resources: snapshot.resources,
                operations: HashMap::new(),
            }),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current state of every resource, including applied mutations.
    pub fn resources(&self) -> anyhow::Result<Vec<Resource>> {
        Ok(self
            .lock()?
            .resources
            .iter()
            .map(|s| s.resource.clone())
            .collect())
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot state for scope {} is poisoned", self.scope))
    }

    fn with_snapshot<T>(
        &self,
        resource: &Resource,
        f: impl FnOnce(&ResourceSnapshot) -> T,
    ) -> anyhow::Result<T> {
        let state = self.lock()?;
        let snapshot = state
            .resources
            .iter()
            .find(|s| s.resource.id == resource.id)
            .ok_or_else(|| anyhow::anyhow!("ResourceNotFound: {}", resource.id))?;
        Ok(f(snapshot))
    }
}

#[async_trait]
impl ResourceInspector for SnapshotProvider {
    async fn utilization(
        &self,
        resource: &Resource,
        metric: &str,
        days: u32,
    ) -> anyhow::Result<Vec<UtilizationSample>> {
        let since = self.clock.now() - chrono::Duration::days(i64::from(days));
        self.with_snapshot(resource, |s| {
            s.utilization
                .get(metric)
                .map(|samples| {
                    samples
                        .iter()
                        .filter(|sample| sample.timestamp >= since)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    async fn power_state(&self, resource: &Resource) -> anyhow::Result<PowerState> {
        self.with_snapshot(resource, |s| s.power_state.unwrap_or(PowerState::Unknown))
    }

    async fn is_referenced_by_aggregator(&self, resource: &Resource) -> anyhow::Result<bool> {
        self.with_snapshot(resource, |s| s.referenced_by_aggregator)
    }
}

#[async_trait]
impl ResourceProvider for SnapshotProvider {
    async fn list(&self, kind: ResourceKind) -> anyhow::Result<Vec<Resource>> {
        Ok(self
            .lock()?
            .resources
            .iter()
            .filter(|s| s.resource.kind == kind)
            .map(|s| s.resource.clone())
            .collect())
    }

    async fn valid_capacities(&self, resource: &Resource) -> anyhow::Result<Vec<u32>> {
        let tier = resource
            .sku_tier()
            .ok_or_else(|| anyhow::anyhow!("{} has no service tier", resource.name))?;
        Ok(match self.capacities.get(tier) {
            Some(capacities) => capacities.clone(),
            None => default_capacities(tier).to_vec(),
        })
    }

    async fn attached_disks(&self, resource: &Resource) -> anyhow::Result<Vec<Resource>> {
        let state = self.lock()?;
        let ids = state
            .resources
            .iter()
            .find(|s| s.resource.id == resource.id)
            .map(|s| s.attached_disks.clone())
            .ok_or_else(|| anyhow::anyhow!("ResourceNotFound: {}", resource.id))?;

        Ok(state
            .resources
            .iter()
            .filter(|s| s.resource.kind == ResourceKind::Disk && ids.contains(&s.resource.id))
            .map(|s| s.resource.clone())
            .collect())
    }

    async fn refresh(&self, resource: &Resource) -> anyhow::Result<Resource> {
        self.with_snapshot(resource, |s| s.resource.clone())
    }

    async fn mutate(
        &self,
        resource: &Resource,
        mutation: Mutation,
    ) -> anyhow::Result<OperationHandle> {
        let mut state = self.lock()?;
        let index = state
            .resources
            .iter()
            .position(|s| s.resource.id == resource.id)
            .ok_or_else(|| anyhow::anyhow!("ResourceNotFound: {}", resource.id))?;

        let status = if state.resources[index].locked {
            OperationStatus::Failed {
                reason: format!("ScopeLocked: {} is locked against {}", resource.name, mutation),
            }
        } else {
            apply(&mut state.resources, index, &mutation);
            OperationStatus::Succeeded
        };
        tracing::debug!(scope = %self.scope, resource = %resource.name, %mutation, ?status, "mutation");

        let handle = OperationHandle {
            id: Uuid::new_v4().to_string(),
            resource_id: resource.id.clone(),
        };
        state.operations.insert(handle.id.clone(), status);
        Ok(handle)
    }

    async fn poll_status(&self, handle: &OperationHandle) -> anyhow::Result<OperationStatus> {
        self.lock()?
            .operations
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown operation {}", handle.id))
    }

    async fn daily_costs(&self, days: u32) -> anyhow::Result<Vec<CostPoint>> {
        Ok(inventory::trailing_costs(&self.costs, days))
    }
}

fn apply(resources: &mut Vec<ResourceSnapshot>, index: usize, mutation: &Mutation) {
    match mutation {
        Mutation::Stop => resources[index].power_state = Some(PowerState::Deallocated),
        Mutation::Delete => {
            resources.remove(index);
        }
        Mutation::UpdateSku { sku } => {
            let resource = &mut resources[index].resource;
            match resource.sku.as_mut() {
                Some(current) => current.name = sku.clone(),
                None => {
                    resource.sku = Some(Sku {
                        name: sku.clone(),
                        tier: None,
                        capacity: None,
                    })
                }
            }
        }
        Mutation::ScaleCapacity { capacity } => {
            if let Some(sku) = resources[index].resource.sku.as_mut() {
                sku.capacity = Some(*capacity);
            }
        }
    }
}
