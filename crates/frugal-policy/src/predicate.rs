//! Predicate evaluation.
//!
//! Filters combine with AND and short-circuit on the first failure; exclusions
//! combine with OR and short-circuit on the first match. List order therefore
//! decides which provider queries are issued, never the final result.

use crate::ResourceInspector;
use crate::error::PredicateError;
use frugal_core::{
    Attachment, Clock, Exclusion, Filter, Predicate, Resource, ResourceKind, UtilizationSample,
};

/// Evaluates policy predicates against live resources.
pub struct PredicateEvaluator<'a> {
    inspector: &'a dyn ResourceInspector,
    clock: &'a dyn Clock,
    /// Metric sampled by `last_used`.
    metric: &'a str,
}

impl<'a> PredicateEvaluator<'a> {
    pub fn new(inspector: &'a dyn ResourceInspector, clock: &'a dyn Clock, metric: &'a str) -> Self {
        Self {
            inspector,
            clock,
            metric,
        }
    }

    /// True iff the resource satisfies every filter. An empty list matches.
    pub async fn matches_all(&self, resource: &Resource, filters: &[Filter]) -> bool {
        for filter in filters {
            if !self.check(resource, filter).await {
                tracing::debug!(
                    resource = %resource.name,
                    filter = filter.name(),
                    "filter not satisfied"
                );
                return false;
            }
        }
        true
    }

    /// True iff the resource matches at least one exclusion. An empty list never matches.
    pub async fn matches_any(&self, resource: &Resource, exclusions: &[Exclusion]) -> bool {
        for exclusion in exclusions {
            if self.check(resource, exclusion).await {
                tracing::debug!(
                    resource = %resource.name,
                    exclusion = exclusion.name(),
                    "resource excluded"
                );
                return true;
            }
        }
        false
    }

    /// Evaluate, logging any error and treating it as "not satisfied".
    async fn check(&self, resource: &Resource, predicate: &Predicate) -> bool {
        match self.evaluate(resource, predicate).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!(
                    resource = %resource.name,
                    predicate = predicate.name(),
                    error = %e,
                    "predicate evaluation failed"
                );
                false
            }
        }
    }

    /// Evaluate a single predicate.
    pub async fn evaluate(
        &self,
        resource: &Resource,
        predicate: &Predicate,
    ) -> Result<bool, PredicateError> {
        match predicate {
            Predicate::LastUsed {
                days,
                cpu_threshold,
            } => {
                let samples = self
                    .inspector
                    .utilization(resource, self.metric, *days)
                    .await
                    .map_err(|e| PredicateError::inspection(&resource.name, predicate.name(), &e))?;
                Ok(self.is_idle(&samples, *days, *cpu_threshold))
            }
            Predicate::Unattached => self.is_unattached(resource).await,
            Predicate::Tag { key, value } => {
                let tags = resource
                    .tags
                    .as_ref()
                    .ok_or_else(|| PredicateError::missing_attribute(&resource.name, "tags"))?;
                Ok(tags.get(key) == Some(value))
            }
            Predicate::Sku { allowed_values } => Ok(resource
                .sku_name()
                .is_some_and(|name| allowed_values.iter().any(|v| v == name))),
            Predicate::Stopped => {
                let state = self
                    .inspector
                    .power_state(resource)
                    .await
                    .map_err(|e| PredicateError::inspection(&resource.name, predicate.name(), &e))?;
                Ok(state.is_stopped())
            }
            Predicate::EmptyBackendPool => match &resource.attachment {
                Attachment::ApplicationGateway { backend_pools } => Ok(backend_pools.is_empty()
                    || backend_pools.iter().any(|pool| pool.addresses.is_empty())),
                _ => Err(PredicateError::not_applicable(
                    &resource.name,
                    predicate.name(),
                    resource.kind,
                )),
            },
        }
    }

    /// Mean below threshold and the window reaches back no further than `days`.
    /// No samples at all counts as idle.
    fn is_idle(&self, samples: &[UtilizationSample], days: u32, threshold: f64) -> bool {
        let Some(earliest) = samples.iter().map(|s| s.timestamp).min() else {
            return true;
        };
        let mean = samples.iter().map(|s| s.value).sum::<f64>() / samples.len() as f64;
        let age_days = (self.clock.now() - earliest).num_days();
        mean < threshold && age_days <= i64::from(days)
    }

    async fn is_unattached(&self, resource: &Resource) -> Result<bool, PredicateError> {
        match (resource.kind, &resource.attachment) {
            (ResourceKind::PublicIp, attachment) => {
                if let Attachment::PublicIp {
                    ip_configuration: Some(_),
                } = attachment
                {
                    return Ok(false);
                }
                let referenced = self
                    .inspector
                    .is_referenced_by_aggregator(resource)
                    .await
                    .map_err(|e| PredicateError::inspection(&resource.name, "unattached", &e))?;
                Ok(!referenced)
            }
            (
                ResourceKind::NetworkInterface,
                Attachment::NetworkInterface {
                    virtual_machine,
                    private_endpoint,
                },
            ) => {
                if private_endpoint.is_some() {
                    return Ok(false);
                }
                Ok(virtual_machine.is_none())
            }
            (ResourceKind::NetworkInterface, _) => Ok(true),
            _ => Ok(!resource.is_managed_by_other_resource()),
        }
    }
}
