use crate::analytics::CostPoint;
use async_trait::async_trait;
use frugal_core::{Resource, ResourceKind};
use frugal_policy::ResourceInspector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A primitive mutating operation understood by every provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Stop and deallocate a compute resource.
    Stop,
    Delete,
    UpdateSku { sku: String },
    ScaleCapacity { capacity: u32 },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Stop => write!(f, "stop"),
            Mutation::Delete => write!(f, "delete"),
            Mutation::UpdateSku { sku } => write!(f, "update_sku({})", sku),
            Mutation::ScaleCapacity { capacity } => write!(f, "scale_capacity({})", capacity),
        }
    }
}

/// Opaque reference to a long-running provider operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationHandle {
    pub id: String,
    pub resource_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Succeeded,
    Failed { reason: String },
}

/// The cloud management API for one account scope.
///
/// Implementations return the parent group of every resource as
/// [`Resource::group`]; nothing downstream re-derives it from the identifier.
#[async_trait]
pub trait ResourceProvider: ResourceInspector {
    /// All resources of `kind` in the scope.
    async fn list(&self, kind: ResourceKind) -> anyhow::Result<Vec<Resource>>;

    /// Capacities offered for the resource's current service tier.
    async fn valid_capacities(&self, resource: &Resource) -> anyhow::Result<Vec<u32>>;

    /// Managed disks attached to a compute resource.
    async fn attached_disks(&self, resource: &Resource) -> anyhow::Result<Vec<Resource>>;

    /// Re-read a resource's current configuration.
    async fn refresh(&self, resource: &Resource) -> anyhow::Result<Resource>;

    /// Start a mutation. Completion is observed through [`Self::poll_status`].
    async fn mutate(
        &self,
        resource: &Resource,
        mutation: Mutation,
    ) -> anyhow::Result<OperationHandle>;

    async fn poll_status(&self, handle: &OperationHandle) -> anyhow::Result<OperationStatus>;

    /// Daily cost of the scope over the trailing `days`.
    async fn daily_costs(&self, _days: u32) -> anyhow::Result<Vec<CostPoint>> {
        Ok(Vec::new())
    }
}

/// An account scope (e.g. a subscription).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Builds one independent provider per scope.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Every scope the credentials can see.
    async fn list_scopes(&self) -> anyhow::Result<Vec<Scope>>;

    async fn connect(&self, scope: &str) -> anyhow::Result<Arc<dyn ResourceProvider>>;
}
