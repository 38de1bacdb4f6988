//! `frugal check` command implementation.
//!
//! Validates the configuration before a run:
//! - required settings are present
//! - the policy file passes JSON Schema validation
//! - policies make sense for their resource kind (capabilities, tier bounds)

use anyhow::{Context, Result};
use frugal_core::config::load_policies;
use frugal_core::{Action, ConfigError, FrugalConfig, Policy, Tier};
use std::path::Path;

/// Severity level for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Category of the check that produced this finding.
    pub category: &'static str,
    pub message: String,
    /// Policy the finding is about, if any.
    pub policy: Option<String>,
}

impl CheckFinding {
    fn error(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
            policy: None,
        }
    }

    fn warning(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(category, message)
        }
    }

    fn info(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::error(category, message)
        }
    }

    fn for_policy(mut self, policy: &Policy) -> Self {
        self.policy = Some(policy.name.clone());
        self
    }
}

#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    fn extend(&mut self, findings: impl IntoIterator<Item = CheckFinding>) {
        self.findings.extend(findings);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn print_summary(&self) {
        let mut findings: Vec<&CheckFinding> = self.findings.iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.category.cmp(b.category)));

        for (severity, title) in [
            (Severity::Error, "❌ Errors"),
            (Severity::Warning, "⚠️  Warnings"),
            (Severity::Info, "ℹ️  Info"),
        ] {
            let group: Vec<_> = findings.iter().filter(|f| f.severity == severity).collect();
            if group.is_empty() {
                continue;
            }
            println!("\n{} ({}):", title, group.len());
            println!("{}", "─".repeat(60));
            for finding in group {
                print_finding(finding);
            }
        }

        let errors = self.error_count();
        let warnings = self.count(Severity::Warning);
        println!();
        println!("{}", "═".repeat(60));
        if errors == 0 && warnings == 0 {
            println!("✅ All checks passed!");
        } else {
            println!("Summary: {} error(s), {} warning(s)", errors, warnings);
        }
    }
}

fn print_finding(finding: &CheckFinding) {
    let icon = match finding.severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
        Severity::Info => "ℹ",
    };
    let location = finding
        .policy
        .as_ref()
        .map(|p| format!(" [{}]", p))
        .unwrap_or_default();
    println!("  {} [{}]{}: {}", icon, finding.category, location, finding.message);
}

/// Run all configuration checks and print the results.
pub fn run(config_path: &Path) -> Result<()> {
    println!("🔍 Checking Frugal configuration...");

    let config = FrugalConfig::load_with_context(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let mut results = CheckResults::default();
    results.extend(check_settings(&config));

    match load_policies(&config.policies) {
        Ok(document) => {
            let enabled = document.policies.iter().filter(|p| p.enabled).count();
            println!(
                "  📋 {} polic(ies) loaded, {} enabled",
                document.policies.len(),
                enabled
            );
            results.extend(check_policies(&document.policies));
        }
        Err(ConfigError::Schema(errors)) => results.extend(
            errors
                .into_iter()
                .map(|e| CheckFinding::error("schema", e)),
        ),
        // Already reported by check_settings.
        Err(ConfigError::MissingSetting(_)) => {}
        Err(e) => results.extend([CheckFinding::error("policies", e.to_string())]),
    }

    results.print_summary();

    if results.has_errors() {
        anyhow::bail!(
            "configuration check failed with {} error(s)",
            results.error_count()
        );
    }
    Ok(())
}

fn check_settings(config: &FrugalConfig) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    if let Err(e) = config.require_policy_file() {
        findings.push(CheckFinding::error("settings", e.to_string()));
    }
    match config.require_snapshot_file() {
        Ok(path) if !path.exists() => findings.push(CheckFinding::error(
            "settings",
            format!("inventory snapshot {} does not exist", path.display()),
        )),
        Ok(_) => {}
        Err(e) => findings.push(CheckFinding::error("settings", e.to_string())),
    }
    if config.scope.resolve().is_none() {
        findings.push(CheckFinding::warning(
            "settings",
            "no default scope; runs need --scope or --all-scopes",
        ));
    }
    findings
}

/// Lint policies for combinations that can never do anything useful.
fn check_policies(policies: &[Policy]) -> Vec<CheckFinding> {
    let mut findings = Vec::new();

    for policy in policies {
        if !policy.enabled {
            findings.push(CheckFinding::info("policies", "policy is disabled").for_policy(policy));
        }
        if policy.actions.is_empty() {
            findings.push(CheckFinding::warning("policies", "policy has no actions").for_policy(policy));
        }

        for action in &policy.actions {
            if let Some(capability) = action.required_capability() {
                if !policy.resource_type.supports(capability) {
                    findings.push(
                        CheckFinding::warning(
                            "actions",
                            format!(
                                "'{}' is not supported for {} resources and will always be skipped",
                                action.kind(),
                                policy.resource_type
                            ),
                        )
                        .for_policy(policy),
                    );
                }
            }

            if matches!(action, Action::Delete) && policy.filters.is_empty() {
                findings.push(
                    CheckFinding::warning(
                        "actions",
                        format!(
                            "deletes every {} resource in scope: no filters",
                            policy.resource_type
                        ),
                    )
                    .for_policy(policy),
                );
            }

            if let Action::ScaleCapacity { tiers } = action {
                findings.extend(check_tiers(tiers).into_iter().map(|f| f.for_policy(policy)));
            }
        }
    }
    findings
}

fn check_tiers(tiers: &[Tier]) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    for tier in tiers {
        if tier.min_capacity > tier.max_capacity {
            findings.push(CheckFinding::error(
                "tiers",
                format!(
                    "tier '{}': min capacity {} exceeds max capacity {}",
                    tier.name, tier.min_capacity, tier.max_capacity
                ),
            ));
            continue;
        }
        for (label, capacity) in [
            ("off-peak", tier.off_peak_capacity),
            ("peak", tier.peak_capacity),
        ] {
            if tier.clamp(capacity) != capacity {
                findings.push(CheckFinding::warning(
                    "tiers",
                    format!(
                        "tier '{}': {} capacity {} will be clamped to {}",
                        tier.name,
                        label,
                        capacity,
                        tier.clamp(capacity)
                    ),
                ));
            }
        }
        if tier.off_peak_start == tier.off_peak_end {
            findings.push(CheckFinding::warning(
                "tiers",
                format!("tier '{}': off-peak window is empty", tier.name),
            ));
        }
    }
    findings
}
