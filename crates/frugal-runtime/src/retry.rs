//! Retry with exponential backoff for read-only provider calls.
//!
//! Only idempotent reads are retried. Mutations pass straight through so the
//! dispatcher sees exactly one attempt per action.

use crate::adapter::{Mutation, OperationHandle, OperationStatus, ResourceProvider};
use crate::analytics::CostPoint;
use async_trait::async_trait;
use frugal_core::{PowerState, Resource, ResourceKind, RetryConfig, UtilizationSample};
use frugal_policy::ResourceInspector;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: f64,
    pub jitter: bool,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            backoff: 1.0,
            jitter: false,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let without_jitter = self.base_delay.as_millis() as f64 * self.backoff.max(1.0).powi(exp);
        let factor = if self.jitter {
            rand::rng().random_range(0.5..1.5)
        } else {
            1.0
        };
        Duration::from_millis((without_jitter * factor) as u64)
    }

    /// Run `op` until it succeeds or the retries are exhausted.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "provider call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            backoff: config.backoff,
            jitter: config.jitter,
        }
    }
}

/// Decorates a provider with retries on its read calls.
pub struct RetryingProvider {
    inner: Arc<dyn ResourceProvider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn ResourceProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ResourceInspector for RetryingProvider {
    async fn utilization(
        &self,
        resource: &Resource,
        metric: &str,
        days: u32,
    ) -> anyhow::Result<Vec<UtilizationSample>> {
        self.policy
            .run("utilization", || self.inner.utilization(resource, metric, days))
            .await
    }

    async fn power_state(&self, resource: &Resource) -> anyhow::Result<PowerState> {
        self.policy
            .run("power_state", || self.inner.power_state(resource))
            .await
    }

    async fn is_referenced_by_aggregator(&self, resource: &Resource) -> anyhow::Result<bool> {
        self.policy
            .run("is_referenced_by_aggregator", || {
                self.inner.is_referenced_by_aggregator(resource)
            })
            .await
    }
}

#[async_trait]
impl ResourceProvider for RetryingProvider {
    async fn list(&self, kind: ResourceKind) -> anyhow::Result<Vec<Resource>> {
        self.policy.run("list", || self.inner.list(kind)).await
    }

    async fn valid_capacities(&self, resource: &Resource) -> anyhow::Result<Vec<u32>> {
        self.policy
            .run("valid_capacities", || self.inner.valid_capacities(resource))
            .await
    }

    async fn attached_disks(&self, resource: &Resource) -> anyhow::Result<Vec<Resource>> {
        self.policy
            .run("attached_disks", || self.inner.attached_disks(resource))
            .await
    }

    async fn refresh(&self, resource: &Resource) -> anyhow::Result<Resource> {
        self.policy
            .run("refresh", || self.inner.refresh(resource))
            .await
    }

    async fn mutate(
        &self,
        resource: &Resource,
        mutation: Mutation,
    ) -> anyhow::Result<OperationHandle> {
        self.inner.mutate(resource, mutation).await
    }

    async fn poll_status(&self, handle: &OperationHandle) -> anyhow::Result<OperationStatus> {
        self.policy
            .run("poll_status", || self.inner.poll_status(handle))
            .await
    }

    async fn daily_costs(&self, days: u32) -> anyhow::Result<Vec<CostPoint>> {
        self.policy
            .run("daily_costs", || self.inner.daily_costs(days))
            .await
    }
}
