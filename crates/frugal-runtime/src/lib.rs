//! Frugal runtime
//!
//! Runs policies against live resources:
//!
//! ```text
//! RunCoordinator ── per scope ──> PolicyRunner ── list ──> ResourceProvider
//!                                      │
//!                                      ├── PredicateEvaluator (frugal-policy)
//!                                      └── ActionDispatcher ── mutate/poll ──> ResourceProvider
//! ```
//!
//! Every action attempt yields exactly one [`frugal_core::StatusLogEntry`],
//! which is also forwarded to the configured [`AuditSink`]. Provider errors
//! never escape the dispatcher; they become `Failed` entries.

pub mod adapter;
pub mod analytics;
pub mod audit;
pub mod coordinator;
pub mod dispatcher;
pub mod report;
pub mod retry;
pub mod runner;
pub mod scope;

pub use adapter::{
    Mutation, OperationHandle, OperationStatus, ProviderFactory, ResourceProvider, Scope,
};
pub use analytics::{
    CostAnalysis, CostAnalytics, CostAnomaly, CostPoint, CostSummary, Trend, TrendDirection,
    ZScoreAnalytics,
};
pub use audit::{
    AuditError, AuditEvent, AuditSink, FanoutAuditSink, JsonLinesAuditSink, NullAuditSink,
    StdoutAuditSink, create_sink,
};
pub use coordinator::{CancellationFlag, RunCoordinator, ScopeSelection};
pub use dispatcher::ActionDispatcher;
pub use report::{RunReport, ScopeCost, ScopeFailure};
pub use retry::{RetryPolicy, RetryingProvider};
pub use runner::{PolicyOutcome, PolicyRunner};
pub use scope::{ExecutionSettings, ScopeContext};
