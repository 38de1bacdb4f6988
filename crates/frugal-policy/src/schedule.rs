//! Capacity scheduling.
//!
//! Decides the capacity a scalable resource should run at right now. The
//! decision is recomputed from the local time of day on every evaluation;
//! nothing about the previous state is remembered.

use crate::error::ScheduleError;
use chrono::NaiveTime;
use frugal_core::{Resource, Tier};
use std::fmt;

/// Whether a tier's off-peak window is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakState {
    OffPeak,
    Peak,
}

impl fmt::Display for PeakState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeakState::OffPeak => write!(f, "off-peak"),
            PeakState::Peak => write!(f, "peak"),
        }
    }
}

/// Off-peak window membership for local time `t`.
///
/// A window whose start is not before its end spans midnight.
pub fn peak_state(tier: &Tier, t: NaiveTime) -> PeakState {
    let off_peak = if tier.off_peak_start < tier.off_peak_end {
        tier.off_peak_start <= t && t < tier.off_peak_end
    } else {
        !(tier.off_peak_end <= t && t < tier.off_peak_start)
    };
    if off_peak {
        PeakState::OffPeak
    } else {
        PeakState::Peak
    }
}

/// Outcome of a scheduling decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// No tier matches the resource's SKU name.
    NoMatchingTier,
    /// The resource already runs at the target capacity.
    NoChange {
        tier: String,
        state: PeakState,
        capacity: u32,
    },
    /// The resource should move from `from` to `to`.
    Scale {
        tier: String,
        state: PeakState,
        from: u32,
        to: u32,
    },
}

/// Decides target capacity from a tier table.
pub struct CapacityScheduler<'a> {
    tiers: &'a [Tier],
}

impl<'a> CapacityScheduler<'a> {
    pub fn new(tiers: &'a [Tier]) -> Self {
        Self { tiers }
    }

    /// First tier whose name is contained in the SKU name.
    pub fn matching_tier(&self, sku_name: &str) -> Option<&'a Tier> {
        self.tiers.iter().find(|tier| tier.matches_sku(sku_name))
    }

    /// Decide the target capacity for `resource` at local time `now`.
    pub fn decide(
        &self,
        resource: &Resource,
        now: NaiveTime,
    ) -> Result<ScheduleDecision, ScheduleError> {
        let Some(tier) = resource.sku_name().and_then(|name| self.matching_tier(name)) else {
            return Ok(ScheduleDecision::NoMatchingTier);
        };
        let current = resource
            .sku_capacity()
            .ok_or_else(|| ScheduleError::MissingCapacity {
                resource: resource.name.clone(),
            })?;

        let state = peak_state(tier, now);
        let wanted = match state {
            PeakState::OffPeak => tier.off_peak_capacity,
            PeakState::Peak => tier.peak_capacity,
        };
        let target = tier.clamp(wanted);

        tracing::debug!(
            resource = %resource.name,
            tier = %tier.name,
            state = %state,
            current,
            target,
            "capacity schedule evaluated"
        );

        if target == current {
            Ok(ScheduleDecision::NoChange {
                tier: tier.name.clone(),
                state,
                capacity: current,
            })
        } else {
            Ok(ScheduleDecision::Scale {
                tier: tier.name.clone(),
                state,
                from: current,
                to: target,
            })
        }
    }

    /// Reject a target the provider does not offer for the service tier.
    pub fn validate_target(
        target: u32,
        service_tier: &str,
        valid: &[u32],
    ) -> Result<(), ScheduleError> {
        if valid.contains(&target) {
            Ok(())
        } else {
            Err(ScheduleError::InvalidCapacity {
                capacity: target,
                service_tier: service_tier.to_string(),
                valid: valid.to_vec(),
            })
        }
    }
}
