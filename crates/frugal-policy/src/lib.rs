//! Frugal policy evaluation
//!
//! Pure decision logic, independent of any concrete cloud:
//! - [`PredicateEvaluator`] decides whether a resource matches a policy's
//!   filters and exclusions
//! - [`CapacityScheduler`] decides the target capacity of a scalable resource
//!   from the time of day and a tier table
//!
//! Anything that needs live data (utilization samples, power state, references
//! from other resources) is read through the [`ResourceInspector`] trait.

use async_trait::async_trait;
use frugal_core::{PowerState, Resource, UtilizationSample};

pub mod error;
pub mod predicate;
pub mod schedule;

pub use error::{PredicateError, PredicateErrorKind, ScheduleError};
pub use predicate::PredicateEvaluator;
pub use schedule::{CapacityScheduler, PeakState, ScheduleDecision, peak_state};

/// Read-only queries the predicate evaluator needs from a resource provider.
#[async_trait]
pub trait ResourceInspector: Send + Sync {
    /// Samples of `metric` over the trailing `days`, oldest first.
    async fn utilization(
        &self,
        resource: &Resource,
        metric: &str,
        days: u32,
    ) -> anyhow::Result<Vec<UtilizationSample>>;

    /// Current power state of a compute resource.
    async fn power_state(&self, resource: &Resource) -> anyhow::Result<PowerState>;

    /// Whether a load balancer, NAT gateway or similar aggregator references
    /// the resource.
    async fn is_referenced_by_aggregator(&self, resource: &Resource) -> anyhow::Result<bool>;
}
