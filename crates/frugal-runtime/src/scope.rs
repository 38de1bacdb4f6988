//! Per-scope execution context.

use crate::adapter::ResourceProvider;
use crate::audit::AuditSink;
use frugal_core::{Clock, ExecutionConfig};
use std::sync::Arc;
use std::time::Duration;

/// Execution tuning shared by every scope of a run.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub poll_interval: Duration,
    pub operation_timeout: Duration,
    pub utilization_metric: String,
    /// Resources whose predicates are evaluated at the same time.
    pub evaluation_concurrency: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

impl From<&ExecutionConfig> for ExecutionSettings {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            operation_timeout: config.operation_timeout(),
            utilization_metric: config.utilization_metric.clone(),
            evaluation_concurrency: config.evaluation_concurrency.max(1),
        }
    }
}

/// Everything a policy run needs for one account scope.
///
/// Each scope owns its provider; nothing here is shared mutably between scopes.
#[derive(Clone)]
pub struct ScopeContext {
    pub scope: String,
    pub provider: Arc<dyn ResourceProvider>,
    pub settings: ExecutionSettings,
    pub clock: Arc<dyn Clock>,
    pub audit: Arc<dyn AuditSink>,
}

impl ScopeContext {
    pub fn new(
        scope: impl Into<String>,
        provider: Arc<dyn ResourceProvider>,
        settings: ExecutionSettings,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            scope: scope.into(),
            provider,
            settings,
            clock,
            audit,
        }
    }
}
