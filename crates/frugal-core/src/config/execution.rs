//! Execution tuning: polling, timeouts, utilization sampling and retries.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Interval between status polls of a long-running operation.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on waiting for a long-running operation.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// Metric sampled by the `last_used` predicate.
    #[serde(default = "default_utilization_metric")]
    pub utilization_metric: String,

    /// Resources whose predicates are evaluated concurrently.
    /// Actions are always dispatched one at a time.
    #[serde(default = "default_evaluation_concurrency")]
    pub evaluation_concurrency: usize,

    /// Retry policy for read-only provider calls.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ExecutionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
            utilization_metric: default_utilization_metric(),
            evaluation_concurrency: default_evaluation_concurrency(),
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential backoff with optional jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay after every retry.
    #[serde(default = "default_backoff")]
    pub backoff: f64,

    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            backoff: default_backoff(),
            jitter: true,
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_operation_timeout_secs() -> u64 {
    1800
}

fn default_utilization_metric() -> String {
    "Percentage CPU".to_string()
}

fn default_evaluation_concurrency() -> usize {
    1
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    5000
}

fn default_backoff() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}
