//! Run coordination across account scopes.
//!
//! Scopes are processed one after another, each with its own provider and
//! context. Cancellation is cooperative: the flag is checked before every
//! scope and every policy, never in the middle of an action.

use crate::adapter::ProviderFactory;
use crate::analytics::{CostAnalytics, CostPoint, CostSummary};
use crate::audit::{AuditSink, NullAuditSink};
use crate::report::{RunReport, ScopeCost, ScopeFailure};
use crate::retry::{RetryPolicy, RetryingProvider};
use crate::runner::PolicyRunner;
use crate::scope::{ExecutionSettings, ScopeContext};
use frugal_core::{Clock, CostConfig, Policy, RunMode, SystemClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Which scopes a run visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSelection {
    Single(String),
    /// Every scope the factory lists, or only these when non-empty.
    All { only: Vec<String> },
}

pub struct RunCoordinator {
    factory: Arc<dyn ProviderFactory>,
    policies: Vec<Policy>,
    settings: ExecutionSettings,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    cost: CostConfig,
    analytics: Option<Arc<dyn CostAnalytics>>,
    cancel: CancellationFlag,
}

impl RunCoordinator {
    pub fn new(factory: Arc<dyn ProviderFactory>, policies: Vec<Policy>) -> Self {
        Self {
            factory,
            policies,
            settings: ExecutionSettings::default(),
            retry: RetryPolicy::none(),
            clock: Arc::new(SystemClock),
            audit: Arc::new(NullAuditSink),
            cost: CostConfig::default(),
            analytics: None,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_cost(mut self, cost: CostConfig, analytics: Option<Arc<dyn CostAnalytics>>) -> Self {
        self.cost = cost;
        self.analytics = analytics;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for cancelling this run from elsewhere.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Run every enabled policy in every selected scope.
    ///
    /// Only failing to determine the scope list is an error; per-scope and
    /// per-resource failures are recorded in the report.
    pub async fn run(&self, selection: &ScopeSelection, mode: RunMode) -> anyhow::Result<RunReport> {
        let mut report = RunReport::new(mode, self.clock.now());
        let scopes = self.resolve_scopes(selection).await?;
        tracing::info!(mode = %mode, scopes = scopes.len(), "starting run");

        for scope in scopes {
            if self.cancel.is_cancelled() {
                tracing::warn!("run cancelled before scope {}", scope);
                report.cancelled = true;
                break;
            }

            if let Err(e) = self.run_scope(&scope, mode, &mut report).await {
                tracing::error!(scope = %scope, error = %e, "scope failed");
                report.failed_scopes.push(ScopeFailure {
                    scope: scope.clone(),
                    error: format!("{:#}", e),
                });
            }
            if report.cancelled {
                break;
            }
        }

        report.finished_at = self.clock.now();
        tracing::info!(
            actions = report.status_log.len(),
            impacted = report.impacted.len(),
            cancelled = report.cancelled,
            "run finished"
        );
        Ok(report)
    }

    async fn resolve_scopes(&self, selection: &ScopeSelection) -> anyhow::Result<Vec<String>> {
        match selection {
            ScopeSelection::Single(scope) => Ok(vec![scope.clone()]),
            ScopeSelection::All { only } if !only.is_empty() => Ok(only.clone()),
            ScopeSelection::All { .. } => Ok(self
                .factory
                .list_scopes()
                .await?
                .into_iter()
                .map(|scope| scope.id)
                .collect()),
        }
    }

    async fn run_scope(
        &self,
        scope: &str,
        mode: RunMode,
        report: &mut RunReport,
    ) -> anyhow::Result<()> {
        tracing::info!(scope, "processing scope");
        let mut provider = self.factory.connect(scope).await?;
        if self.retry.max_retries > 0 {
            provider = Arc::new(RetryingProvider::new(provider, self.retry.clone()));
        }
        let ctx = ScopeContext::new(
            scope,
            provider,
            self.settings.clone(),
            self.clock.clone(),
            self.audit.clone(),
        );
        report.scopes.push(scope.to_string());

        if self.cost.enabled {
            if let Some(cost) = self.collect_costs(&ctx).await {
                report.costs.push(cost);
            }
        }

        let runner = PolicyRunner::new(&ctx);
        for policy in self.policies.iter().filter(|p| p.enabled) {
            if self.cancel.is_cancelled() {
                tracing::warn!(scope, "run cancelled before policy {}", policy.name);
                report.cancelled = true;
                break;
            }
            let outcome = runner.run(policy, mode).await;
            report.status_log.extend(outcome.status_log);
            report.impacted.extend(outcome.impacted);
            report.non_impacted.extend(outcome.non_impacted);
        }
        Ok(())
    }

    async fn collect_costs(&self, ctx: &ScopeContext) -> Option<ScopeCost> {
        let points = match ctx.provider.daily_costs(self.cost.lookback_days).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(scope = %ctx.scope, error = %e, "failed to fetch cost data");
                return None;
            }
        };

        let today = self.clock.now().date_naive();
        let Some(summary) = CostSummary::from_points(&points, today) else {
            tracing::debug!(scope = %ctx.scope, "no complete days of cost data");
            return None;
        };
        tracing::info!(
            scope = %ctx.scope,
            total = summary.total,
            average = summary.average,
            "cost summary"
        );

        let complete: Vec<CostPoint> = points.into_iter().filter(|p| p.date < today).collect();
        let analysis = self
            .analytics
            .as_ref()
            .and_then(|analytics| match analytics.analyze(&complete) {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    tracing::warn!(scope = %ctx.scope, error = %e, "cost analysis failed");
                    None
                }
            });

        Some(ScopeCost {
            scope: ctx.scope.clone(),
            summary,
            analysis,
        })
    }
}
