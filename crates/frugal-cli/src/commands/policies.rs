//! `frugal policies` command: list enabled policies.

use anyhow::{Context, Result};
use frugal_core::config::load_policies;
use frugal_core::{Action, FrugalConfig, Policy, Predicate};
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    let config = FrugalConfig::load_with_context(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let policies = load_policies(&config.policies)?.enabled();

    if policies.is_empty() {
        println!("No enabled policies.");
        return Ok(());
    }

    println!("{} enabled polic(ies):", policies.len());
    for policy in &policies {
        print_policy(policy);
    }
    Ok(())
}

fn print_policy(policy: &Policy) {
    println!();
    println!("  {} ({})", policy.name, policy.resource_type);
    if let Some(description) = &policy.description {
        println!("    {}", description);
    }
    if !policy.filters.is_empty() {
        println!("    filters:    {}", join(&policy.filters, describe_predicate));
    }
    if !policy.exclusions.is_empty() {
        println!("    exclusions: {}", join(&policy.exclusions, describe_predicate));
    }
    println!("    actions:    {}", join(&policy.actions, describe_action));
}

fn join<T>(items: &[T], describe: fn(&T) -> String) -> String {
    items.iter().map(describe).collect::<Vec<_>>().join(", ")
}

fn describe_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::LastUsed {
            days,
            cpu_threshold,
        } => format!("last_used(<{}% over {}d)", cpu_threshold, days),
        Predicate::Tag { key, value } => format!("tag({}={})", key, value),
        Predicate::Sku { allowed_values } => format!("sku({})", allowed_values.join("|")),
        other => other.name().to_string(),
    }
}

fn describe_action(action: &Action) -> String {
    match action {
        Action::UpdateSku { sku } => format!("update_sku({})", sku),
        Action::Downgrade { sku } => format!("downgrade({})", sku),
        Action::ScaleCapacity { tiers } => format!(
            "scale_capacity({})",
            tiers
                .iter()
                .map(|t| format!(
                    "{} {}..{}: {}/{}",
                    t.name,
                    t.off_peak_start.format("%H:%M"),
                    t.off_peak_end.format("%H:%M"),
                    t.off_peak_capacity,
                    t.peak_capacity
                ))
                .collect::<Vec<_>>()
                .join("; ")
        ),
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_parameterized_predicates_and_actions() {
        let last_used = Predicate::LastUsed {
            days: 7,
            cpu_threshold: 5.0,
        };
        assert_eq!(describe_predicate(&last_used), "last_used(<5% over 7d)");
        assert_eq!(describe_predicate(&Predicate::Stopped), "stopped");
        assert_eq!(describe_action(&Action::Delete), "delete");
        assert_eq!(
            describe_action(&Action::Downgrade {
                sku: "Standard_LRS".to_string()
            }),
            "downgrade(Standard_LRS)"
        );
    }
}
