//! Policy runner: enumerate, evaluate, dispatch, book-keep.

use crate::adapter::ResourceProvider;
use crate::audit::AuditEvent;
use crate::dispatcher::ActionDispatcher;
use crate::scope::ScopeContext;
use frugal_core::{
    ActionStatus, ImpactRecord, NonImpactRecord, Policy, Resource, RunMode, StatusLogEntry,
};
use frugal_policy::{PredicateEvaluator, ResourceInspector};
use futures::stream::{self, StreamExt};

/// Everything one policy produced in one scope.
#[derive(Debug, Clone, Default)]
pub struct PolicyOutcome {
    pub status_log: Vec<StatusLogEntry>,
    pub impacted: Vec<ImpactRecord>,
    /// Set when the policy impacted nothing.
    pub non_impacted: Option<NonImpactRecord>,
}

pub struct PolicyRunner<'a> {
    ctx: &'a ScopeContext,
}

impl<'a> PolicyRunner<'a> {
    pub fn new(ctx: &'a ScopeContext) -> Self {
        Self { ctx }
    }

    /// Run one policy against every resource of its kind.
    ///
    /// Predicates may be evaluated for several resources at once; actions are
    /// always dispatched one at a time, in resource order and then list order.
    pub async fn run(&self, policy: &Policy, mode: RunMode) -> PolicyOutcome {
        let scope = self.ctx.scope.as_str();
        tracing::info!(scope, policy = %policy.name, kind = %policy.resource_type, "running policy");

        let resources = match self.ctx.provider.list(policy.resource_type).await {
            Ok(resources) => resources,
            Err(e) => {
                tracing::error!(
                    scope,
                    policy = %policy.name,
                    error = %e,
                    "failed to enumerate resources"
                );
                return PolicyOutcome {
                    non_impacted: Some(self.non_impacted(
                        policy,
                        Some(format!("enumeration failed: {:#}", e)),
                    )),
                    ..Default::default()
                };
            }
        };

        let matched = self.select(policy, &resources).await;
        tracing::debug!(
            scope,
            policy = %policy.name,
            total = resources.len(),
            matched = matched.len(),
            "predicates evaluated"
        );

        let dispatcher = ActionDispatcher::new(self.ctx);
        let dry_run = mode.is_dry_run();
        let mut outcome = PolicyOutcome::default();

        for resource in matched {
            let mut changed = false;
            for action in &policy.actions {
                let entry = dispatcher.dispatch(resource, action, dry_run).await;
                self.ctx.audit.record(AuditEvent::from_entry(
                    &entry,
                    &policy.name,
                    dry_run,
                    self.ctx.clock.now(),
                ));
                // Only an explicit No Change leaves a resource out of the impact list.
                changed |= entry.status != ActionStatus::NoChange;
                outcome.status_log.push(entry);
            }

            if dry_run || changed {
                outcome.impacted.push(ImpactRecord {
                    scope: scope.to_string(),
                    policy_name: policy.name.clone(),
                    resource_name: resource.name.clone(),
                    actions: policy.actions_joined(),
                });
            }
        }

        if outcome.impacted.is_empty() {
            tracing::info!(scope, policy = %policy.name, "no resources impacted");
            outcome.non_impacted = Some(self.non_impacted(policy, None));
        }
        outcome
    }

    /// Resources that match no exclusion and every filter, in enumeration order.
    async fn select<'r>(&self, policy: &Policy, resources: &'r [Resource]) -> Vec<&'r Resource> {
        let provider: &dyn ResourceProvider = &*self.ctx.provider;
        let inspector: &dyn ResourceInspector = provider;
        let evaluator = PredicateEvaluator::new(
            inspector,
            &*self.ctx.clock,
            &self.ctx.settings.utilization_metric,
        );
        let evaluator = &evaluator;

        let verdicts: Vec<bool> = stream::iter(resources)
            .map(|resource| async move {
                if evaluator.matches_any(resource, &policy.exclusions).await {
                    return false;
                }
                evaluator.matches_all(resource, &policy.filters).await
            })
            .buffered(self.ctx.settings.evaluation_concurrency.max(1))
            .collect()
            .await;

        resources
            .iter()
            .zip(verdicts)
            .filter_map(|(resource, matched)| matched.then_some(resource))
            .collect()
    }

    fn non_impacted(&self, policy: &Policy, note: Option<String>) -> NonImpactRecord {
        NonImpactRecord {
            scope: self.ctx.scope.clone(),
            policy_name: policy.name.clone(),
            resource_type: policy.resource_type,
            note,
        }
    }
}
