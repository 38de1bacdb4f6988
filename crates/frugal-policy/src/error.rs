//! Error types for predicate evaluation and capacity scheduling.

use std::fmt;

/// A predicate could not be evaluated for a resource.
///
/// The evaluator logs these and treats the predicate as not satisfied.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PredicateError {
    pub kind: PredicateErrorKind,
    pub message: String,
}

impl PredicateError {
    pub fn new(kind: PredicateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The resource lacks an attribute the predicate reads.
    pub fn missing_attribute(resource: &str, attribute: &str) -> Self {
        Self::new(
            PredicateErrorKind::MissingAttribute,
            format!("Resource '{}' has no '{}' attribute", resource, attribute),
        )
    }

    /// A provider query backing the predicate failed.
    pub fn inspection(resource: &str, predicate: &str, source: &anyhow::Error) -> Self {
        Self::new(
            PredicateErrorKind::Inspection,
            format!(
                "Failed to evaluate '{}' for resource '{}': {:#}",
                predicate, resource, source
            ),
        )
    }

    /// The predicate has no meaning for this resource kind.
    pub fn not_applicable(resource: &str, predicate: &str, kind: impl fmt::Display) -> Self {
        Self::new(
            PredicateErrorKind::NotApplicable,
            format!(
                "Predicate '{}' does not apply to {} '{}'",
                predicate, kind, resource
            ),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateErrorKind {
    MissingAttribute,
    Inspection,
    NotApplicable,
}

/// The capacity scheduler cannot produce a usable target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("resource '{resource}' reports no current capacity")]
    MissingCapacity { resource: String },

    /// The target is not offered for the resource's service tier.
    /// Retrying cannot succeed.
    #[error("capacity {capacity} is not valid for tier {service_tier} (valid: {valid:?})")]
    InvalidCapacity {
        capacity: u32,
        service_tier: String,
        valid: Vec<u32>,
    },
}
