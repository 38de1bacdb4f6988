//! `frugal run` command.
//!
//! Loads configuration and policies, connects the snapshot provider and runs
//! every enabled policy. Failed remediations are reported, never fatal; only
//! configuration problems end the process with an error.

use anyhow::{Context, Result};
use frugal_adapter_snapshot::SnapshotProviderFactory;
use frugal_core::{FrugalConfig, RunMode, config::load_policies};
use frugal_runtime::{
    ExecutionSettings, RetryPolicy, RunCoordinator, RunReport, ScopeSelection, ZScoreAnalytics,
    create_sink,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct RunArgs {
    pub config_path: PathBuf,
    pub mode: RunMode,
    pub all_scopes: bool,
    pub scope: Option<String>,
    pub output: Option<PathBuf>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = FrugalConfig::load_with_context(&args.config_path)
        .with_context(|| format!("failed to load {}", args.config_path.display()))?;

    let policies = load_policies(&config.policies)?.enabled();
    if policies.is_empty() {
        tracing::warn!("no enabled policies; nothing to do");
    }
    let selection = scope_selection(&config, &args)?;

    let factory = SnapshotProviderFactory::from_file(config.require_snapshot_file()?).await?;
    let audit = create_sink(&config.audit).context("failed to open audit log")?;

    let coordinator = RunCoordinator::new(Arc::new(factory), policies)
        .with_settings(ExecutionSettings::from(&config.execution))
        .with_retry(RetryPolicy::from(&config.execution.retry))
        .with_audit(audit)
        .with_cost(
            config.cost.clone(),
            Some(Arc::new(ZScoreAnalytics::default())),
        );

    let cancel = coordinator.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current policy");
            cancel.cancel();
        }
    });

    let report = coordinator.run(&selection, args.mode).await?;
    print_report(&report, config.project.as_deref());

    if let Some(path) = args.output.as_deref().or(config.report.output_file.as_deref()) {
        write_report(&report, path)?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

fn scope_selection(config: &FrugalConfig, args: &RunArgs) -> Result<ScopeSelection> {
    if let Some(scope) = &args.scope {
        return Ok(ScopeSelection::Single(scope.clone()));
    }
    if args.all_scopes {
        return Ok(ScopeSelection::All {
            only: config.scope.all.clone(),
        });
    }
    Ok(ScopeSelection::Single(config.require_scope()?))
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))
}

fn report_header(report: &RunReport, project: Option<&str>) -> String {
    let elapsed = report.finished_at - report.started_at;
    let run = format!(
        "Run ({}) finished in {}s across {} scope(s)",
        report.mode,
        elapsed.num_seconds(),
        report.scopes.len()
    );
    match project {
        Some(project) => format!("{}: {}", project, run),
        None => run,
    }
}

fn print_report(report: &RunReport, project: Option<&str>) {
    println!();
    println!("{}", "═".repeat(100));
    println!("{}", report_header(report, project));
    if report.cancelled {
        println!("⚠️  Run was cancelled before all policies were evaluated.");
    }

    if !report.status_log.is_empty() {
        println!("\nStatus log:");
        println!(
            "  {:<20} {:<28} {:<15} {:<10} Message",
            "Scope", "Resource", "Action", "Status"
        );
        println!("  {}", "─".repeat(96));
        for entry in &report.status_log {
            println!(
                "  {:<20} {:<28} {:<15} {:<10} {}",
                entry.scope,
                entry.resource_name,
                entry.action.to_string(),
                entry.status.to_string(),
                entry.message
            );
        }
    }

    if !report.impacted.is_empty() {
        println!("\nImpacted resources:");
        println!("  {:<20} {:<28} {:<28} Actions", "Scope", "Policy", "Resource");
        println!("  {}", "─".repeat(96));
        for record in &report.impacted {
            println!(
                "  {:<20} {:<28} {:<28} {}",
                record.scope, record.policy_name, record.resource_name, record.actions
            );
        }
    }

    if !report.non_impacted.is_empty() {
        println!("\nPolicies with no impact:");
        println!("  {:<20} {:<28} {:<20} Note", "Scope", "Policy", "Resource type");
        println!("  {}", "─".repeat(96));
        for record in &report.non_impacted {
            println!(
                "  {:<20} {:<28} {:<20} {}",
                record.scope,
                record.policy_name,
                record.resource_type.to_string(),
                record.note.as_deref().unwrap_or("")
            );
        }
    }

    if !report.costs.is_empty() {
        println!("\nCost summary:");
        println!(
            "  {:<20} {:>5} {:>12} {:>10} {:>10} {:>10}  Trend",
            "Scope", "Days", "Total", "Average", "Max", "Min"
        );
        println!("  {}", "─".repeat(96));
        for cost in &report.costs {
            let s = &cost.summary;
            let trend = match &cost.analysis {
                Some(a) => format!(
                    "{:?} ({:+.2}/day), {} anomalies",
                    a.trend.direction,
                    a.trend.slope_per_day,
                    a.anomalies.len()
                ),
                None => "-".to_string(),
            };
            println!(
                "  {:<20} {:>5} {:>12.2} {:>10.2} {:>10.2} {:>10.2}  {}",
                cost.scope, s.days, s.total, s.average, s.maximum, s.minimum, trend
            );
        }
    }

    if !report.failed_scopes.is_empty() {
        println!("\n❌ Scopes that could not be processed:");
        for failure in &report.failed_scopes {
            println!("  {}: {}", failure.scope, failure.error);
        }
    }

    let mut counts: Vec<(String, usize)> = Vec::new();
    for entry in &report.status_log {
        let status = entry.status.to_string();
        match counts.iter_mut().find(|(s, _)| *s == status) {
            Some((_, n)) => *n += 1,
            None => counts.push((status, 1)),
        }
    }
    println!();
    println!("{}", "═".repeat(100));
    if counts.is_empty() {
        println!("No actions dispatched.");
    } else {
        let summary: Vec<String> = counts
            .iter()
            .map(|(status, n)| format!("{}: {}", status, n))
            .collect();
        println!("Actions: {}", summary.join(", "));
    }
    if report.has_failures() {
        println!("❌ Some remediations failed; see the status log above.");
    }
}
