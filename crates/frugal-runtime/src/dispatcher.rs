//! Action dispatch.
//!
//! Routes an action to one handler for the resource's kind and turns the
//! outcome into a status log entry. Handlers inspect current state before
//! mutating, so re-running an action that already took effect is a no-op.
//! Provider errors are caught here and never reach the policy runner.

use crate::adapter::{Mutation, OperationHandle, OperationStatus};
use crate::scope::ScopeContext;
use frugal_core::{Action, ActionStatus, Resource, ResourceKind, StatusLogEntry, Tier};
use frugal_policy::{CapacityScheduler, ScheduleDecision};

/// Terminal outcome of a long-running operation.
enum Completion {
    Succeeded,
    Failed(String),
    TimedOut,
}

type Outcome = (ActionStatus, String);

pub struct ActionDispatcher<'a> {
    ctx: &'a ScopeContext,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(ctx: &'a ScopeContext) -> Self {
        Self { ctx }
    }

    /// Apply (or simulate) one action against one resource.
    pub async fn dispatch(
        &self,
        resource: &Resource,
        action: &Action,
        dry_run: bool,
    ) -> StatusLogEntry {
        let kind = action.kind();

        if let Some(capability) = action.required_capability() {
            if !resource.kind.supports(capability) {
                return self.entry(
                    resource,
                    action,
                    ActionStatus::NoAction,
                    format!(
                        "Action '{}' is not supported for {} resources",
                        kind, resource.kind
                    ),
                );
            }
        }

        if dry_run {
            let message = self.describe(resource, action);
            tracing::info!(resource = %resource.name, action = %kind, "{}", message);
            return self.entry(resource, action, ActionStatus::DryRun, message);
        }

        let (status, message) = match self.apply(resource, action).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    resource = %resource.name,
                    action = %kind,
                    error = %e,
                    "action failed"
                );
                (ActionStatus::Failed, format!("{:#}", e))
            }
        };

        tracing::info!(
            scope = %self.ctx.scope,
            resource = %resource.name,
            action = %kind,
            status = %status,
            "{}",
            message
        );
        self.entry(resource, action, status, message)
    }

    fn entry(
        &self,
        resource: &Resource,
        action: &Action,
        status: ActionStatus,
        message: impl Into<String>,
    ) -> StatusLogEntry {
        StatusLogEntry::new(
            self.ctx.scope.as_str(),
            resource.name.as_str(),
            action.kind(),
            status,
            message,
        )
    }

    /// Human-readable description of what apply mode would do.
    fn describe(&self, resource: &Resource, action: &Action) -> String {
        let target = format!("{} '{}'", resource.kind, resource.name);
        match action {
            Action::Stop => format!("Dry run: would stop {}", target),
            Action::Delete => format!("Dry run: would delete {}", target),
            Action::UpdateSku { sku } => format!(
                "Dry run: would update SKU of {} from {} to {}",
                target,
                resource.sku_name().unwrap_or("unknown"),
                sku
            ),
            Action::Downgrade { sku } if resource.kind == ResourceKind::Vm => {
                format!("Dry run: would downgrade attached disks of {} to {}", target, sku)
            }
            Action::Downgrade { sku } => format!("Dry run: would downgrade {} to {}", target, sku),
            Action::ScaleCapacity { tiers } => {
                let scheduler = CapacityScheduler::new(tiers);
                match scheduler.decide(resource, self.ctx.clock.local_time()) {
                    Ok(ScheduleDecision::Scale {
                        tier, state, from, to, ..
                    }) => format!(
                        "Dry run: would scale {} from {} to {} ({} window, tier {})",
                        target, from, to, state, tier
                    ),
                    Ok(ScheduleDecision::NoChange { capacity, .. }) => format!(
                        "Dry run: {} already at capacity {}, no scaling required",
                        target, capacity
                    ),
                    Ok(ScheduleDecision::NoMatchingTier) => {
                        format!("Dry run: no tier matches the SKU of {}", target)
                    }
                    Err(e) => format!("Dry run: cannot schedule {}: {}", target, e),
                }
            }
            Action::Log => format!("Dry run: would log {}", target),
        }
    }

    async fn apply(&self, resource: &Resource, action: &Action) -> anyhow::Result<Outcome> {
        match action {
            Action::Stop => self.stop(resource).await,
            Action::Delete => self.delete(resource).await,
            Action::UpdateSku { sku } => self.update_sku(resource, sku).await,
            Action::Downgrade { sku } => match resource.kind {
                ResourceKind::Vm => self.downgrade_attached_disks(resource, sku).await,
                _ => self.update_sku(resource, sku).await,
            },
            Action::ScaleCapacity { tiers } => self.scale_capacity(resource, tiers).await,
            Action::Log => Ok((
                ActionStatus::Success,
                format!("Logged {} '{}'", resource.kind, resource.name),
            )),
        }
    }

    async fn stop(&self, resource: &Resource) -> anyhow::Result<Outcome> {
        let state = self.ctx.provider.power_state(resource).await?;
        if state.is_stopped() {
            return Ok((
                ActionStatus::NoAction,
                format!("{} is already stopped", resource.kind),
            ));
        }

        let handle = self.ctx.provider.mutate(resource, Mutation::Stop).await?;
        Ok(self.completion_outcome(
            self.wait_for(&handle).await?,
            format!("{} stopped successfully.", resource.kind),
            "stop",
        ))
    }

    async fn delete(&self, resource: &Resource) -> anyhow::Result<Outcome> {
        let handle = self.ctx.provider.mutate(resource, Mutation::Delete).await?;
        Ok(self.completion_outcome(
            self.wait_for(&handle).await?,
            format!("{} deleted successfully.", resource.kind),
            "delete",
        ))
    }

    async fn update_sku(&self, resource: &Resource, sku: &str) -> anyhow::Result<Outcome> {
        let current = resource.sku_name().unwrap_or("unknown").to_string();
        if current == sku {
            return Ok((
                ActionStatus::NoAction,
                format!("{} '{}' is already {}", resource.kind, resource.name, sku),
            ));
        }

        let handle = self
            .ctx
            .provider
            .mutate(
                resource,
                Mutation::UpdateSku {
                    sku: sku.to_string(),
                },
            )
            .await?;
        match self.wait_for(&handle).await? {
            Completion::Succeeded => {}
            other => {
                return Ok(self.completion_outcome(other, String::new(), "SKU update"));
            }
        }

        let refreshed = self.ctx.provider.refresh(resource).await?;
        match refreshed.sku_name() {
            Some(after) if after == sku => Ok((
                ActionStatus::Success,
                format!("Updated SKU from {} to {}", current, sku),
            )),
            after => Ok((
                ActionStatus::Failed,
                format!(
                    "SKU is {} after update, expected {}",
                    after.unwrap_or("unknown"),
                    sku
                ),
            )),
        }
    }

    /// Downgrade every managed disk of a VM; one aggregated outcome.
    async fn downgrade_attached_disks(
        &self,
        vm: &Resource,
        sku: &str,
    ) -> anyhow::Result<Outcome> {
        let disks = self.ctx.provider.attached_disks(vm).await?;
        if disks.is_empty() {
            return Ok((
                ActionStatus::NoAction,
                format!("VM '{}' has no attached managed disks", vm.name),
            ));
        }

        let mut changed = Vec::new();
        let mut failed = Vec::new();
        for disk in &disks {
            let outcome = match self.update_sku(disk, sku).await {
                Ok(outcome) => outcome,
                Err(e) => (ActionStatus::Failed, format!("{:#}", e)),
            };
            tracing::debug!(vm = %vm.name, disk = %disk.name, status = %outcome.0, "{}", outcome.1);
            match outcome.0 {
                ActionStatus::Success => changed.push(disk.name.clone()),
                ActionStatus::Failed | ActionStatus::Error => {
                    failed.push(format!("{}: {}", disk.name, outcome.1))
                }
                _ => {}
            }
        }

        if !failed.is_empty() {
            Ok((
                ActionStatus::Failed,
                format!("Failed to downgrade disks: {}", failed.join("; ")),
            ))
        } else if changed.is_empty() {
            Ok((
                ActionStatus::NoAction,
                format!("All disks of VM '{}' are already {}", vm.name, sku),
            ))
        } else {
            Ok((
                ActionStatus::Success,
                format!("Downgraded disks to {}: {}", sku, changed.join(", ")),
            ))
        }
    }

    async fn scale_capacity(&self, resource: &Resource, tiers: &[Tier]) -> anyhow::Result<Outcome> {
        let scheduler = CapacityScheduler::new(tiers);
        let (from, to, state) = match scheduler.decide(resource, self.ctx.clock.local_time())? {
            ScheduleDecision::NoMatchingTier => {
                return Ok((
                    ActionStatus::NoChange,
                    format!(
                        "No tier matches SKU {}",
                        resource.sku_name().unwrap_or("unknown")
                    ),
                ));
            }
            ScheduleDecision::NoChange {
                capacity, state, ..
            } => {
                return Ok((
                    ActionStatus::NoChange,
                    format!(
                        "Current capacity {} is already optimal for the {} window",
                        capacity, state
                    ),
                ));
            }
            ScheduleDecision::Scale {
                from, to, state, ..
            } => (from, to, state),
        };

        let valid = self.ctx.provider.valid_capacities(resource).await?;
        let service_tier = resource.sku_tier().unwrap_or("unknown");
        if let Err(e) = CapacityScheduler::validate_target(to, service_tier, &valid) {
            tracing::error!(resource = %resource.name, error = %e, "invalid target capacity");
            return Ok((ActionStatus::Error, e.to_string()));
        }

        let handle = self
            .ctx
            .provider
            .mutate(resource, Mutation::ScaleCapacity { capacity: to })
            .await?;
        match self.wait_for(&handle).await? {
            Completion::Succeeded => {}
            other => return Ok(self.completion_outcome(other, String::new(), "scale")),
        }

        if self.wait_for_capacity(resource, to).await? {
            Ok((
                ActionStatus::Success,
                format!("Scaled capacity from {} to {} ({} window)", from, to, state),
            ))
        } else {
            Ok((
                ActionStatus::Failed,
                format!(
                    "Capacity did not reach {} within {}s",
                    to,
                    self.ctx.settings.operation_timeout.as_secs()
                ),
            ))
        }
    }

    fn completion_outcome(&self, completion: Completion, success: String, operation: &str) -> Outcome {
        match completion {
            Completion::Succeeded => (ActionStatus::Success, success),
            Completion::Failed(reason) => {
                (ActionStatus::Failed, format!("{} failed: {}", operation, reason))
            }
            Completion::TimedOut => (
                ActionStatus::Failed,
                format!(
                    "{} did not complete within {}s",
                    operation,
                    self.ctx.settings.operation_timeout.as_secs()
                ),
            ),
        }
    }

    /// Poll an operation at a fixed interval until it is terminal or times out.
    async fn wait_for(&self, handle: &OperationHandle) -> anyhow::Result<Completion> {
        let timeout = self.ctx.settings.operation_timeout;
        match tokio::time::timeout(timeout, self.poll_until_terminal(handle)).await {
            Ok(completion) => completion,
            Err(_) => Ok(Completion::TimedOut),
        }
    }

    async fn poll_until_terminal(&self, handle: &OperationHandle) -> anyhow::Result<Completion> {
        loop {
            match self.ctx.provider.poll_status(handle).await? {
                OperationStatus::Succeeded => return Ok(Completion::Succeeded),
                OperationStatus::Failed { reason } => return Ok(Completion::Failed(reason)),
                OperationStatus::Pending => {
                    tracing::debug!(operation = %handle.id, "operation in progress");
                    tokio::time::sleep(self.ctx.settings.poll_interval).await;
                }
            }
        }
    }

    /// Re-read the resource until it reports `target` capacity.
    async fn wait_for_capacity(&self, resource: &Resource, target: u32) -> anyhow::Result<bool> {
        let poll = async {
            loop {
                let current = self.ctx.provider.refresh(resource).await?;
                if current.sku_capacity() == Some(target) {
                    return Ok::<_, anyhow::Error>(());
                }
                tracing::debug!(resource = %resource.name, target, "waiting for capacity");
                tokio::time::sleep(self.ctx.settings.poll_interval).await;
            }
        };
        match tokio::time::timeout(self.ctx.settings.operation_timeout, poll).await {
            Ok(result) => result.map(|()| true),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ResourceProvider;
    use crate::audit::NullAuditSink;
    use crate::scope::ExecutionSettings;
    use async_trait::async_trait;
    use chrono::{NaiveTime, TimeZone, Utc};
    use frugal_core::{ActionKind, FixedClock, PowerState, Sku, UtilizationSample};
    use frugal_policy::ResourceInspector;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records mutations and applies them to an in-memory copy.
    #[derive(Default)]
    struct FakeProvider {
        power: Option<PowerState>,
        valid: Vec<u32>,
        disks: Vec<Resource>,
        state: Mutex<HashMap<String, Resource>>,
        mutations: Mutex<Vec<Mutation>>,
        statuses: Mutex<Vec<OperationStatus>>,
        fail_mutate: bool,
        ignore_updates: bool,
    }

    impl FakeProvider {
        fn mutations(&self) -> Vec<Mutation> {
            self.mutations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceInspector for FakeProvider {
        async fn utilization(
            &self,
            _: &Resource,
            _: &str,
            _: u32,
        ) -> anyhow::Result<Vec<UtilizationSample>> {
            Ok(Vec::new())
        }

        async fn power_state(&self, _: &Resource) -> anyhow::Result<PowerState> {
            Ok(self.power.unwrap_or(PowerState::Running))
        }

        async fn is_referenced_by_aggregator(&self, _: &Resource) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl ResourceProvider for FakeProvider {
        async fn list(&self, _: ResourceKind) -> anyhow::Result<Vec<Resource>> {
            Ok(Vec::new())
        }

        async fn valid_capacities(&self, _: &Resource) -> anyhow::Result<Vec<u32>> {
            Ok(self.valid.clone())
        }

        async fn attached_disks(&self, _: &Resource) -> anyhow::Result<Vec<Resource>> {
            Ok(self.disks.clone())
        }

        async fn refresh(&self, resource: &Resource) -> anyhow::Result<Resource> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .get(&resource.id)
                .cloned()
                .unwrap_or_else(|| resource.clone()))
        }

        async fn mutate(
            &self,
            resource: &Resource,
            mutation: Mutation,
        ) -> anyhow::Result<OperationHandle> {
            if self.fail_mutate {
                anyhow::bail!("429 Too Many Requests");
            }
            self.mutations.lock().unwrap().push(mutation.clone());
            if !self.ignore_updates {
                let mut updated = resource.clone();
                match &mutation {
                    Mutation::UpdateSku { sku } => {
                        updated.sku.get_or_insert(Sku {
                            name: String::new(),
                            tier: None,
                            capacity: None,
                        }).name = sku.clone();
                    }
                    Mutation::ScaleCapacity { capacity } => {
                        if let Some(s) = updated.sku.as_mut() {
                            s.capacity = Some(*capacity);
                        }
                    }
                    _ => {}
                }
                self.state.lock().unwrap().insert(resource.id.clone(), updated);
            }
            Ok(OperationHandle {
                id: format!("op-{}", resource.name),
                resource_id: resource.id.clone(),
            })
        }

        async fn poll_status(&self, _: &OperationHandle) -> anyhow::Result<OperationStatus> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.is_empty() {
                Ok(OperationStatus::Succeeded)
            } else {
                Ok(statuses.remove(0))
            }
        }
    }

    fn context(provider: Arc<FakeProvider>, local: NaiveTime) -> ScopeContext {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
            .with_local_time(local);
        ScopeContext::new(
            "sub-1",
            provider,
            ExecutionSettings {
                poll_interval: Duration::from_millis(1),
                operation_timeout: Duration::from_millis(200),
                utilization_metric: "Percentage CPU".to_string(),
                evaluation_concurrency: 1,
            },
            Arc::new(clock),
            Arc::new(NullAuditSink),
        )
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn database(capacity: u32) -> Resource {
        Resource::new("/sql/db-1", "db-1", ResourceKind::SqlDatabase).with_sku(Sku {
            name: "Standard".to_string(),
            tier: Some("Standard".to_string()),
            capacity: Some(capacity),
        })
    }

    fn scale_action(peak: u32) -> Action {
        Action::ScaleCapacity {
            tiers: vec![Tier {
                name: "Standard".to_string(),
                off_peak_start: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                off_peak_end: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                off_peak_capacity: 10,
                peak_capacity: peak,
                min_capacity: 10,
                max_capacity: 3000,
            }],
        }
    }

    fn disk(name: &str, sku: &str) -> Resource {
        Resource::new(format!("/disks/{}", name), name, ResourceKind::Disk).with_sku(Sku {
            name: sku.to_string(),
            tier: None,
            capacity: None,
        })
    }

    #[tokio::test]
    async fn dry_run_never_mutates() {
        let provider = Arc::new(FakeProvider::default());
        let ctx = context(provider.clone(), noon());
        let dispatcher = ActionDispatcher::new(&ctx);

        let vm = Resource::new("/vms/vm-1", "vm-1", ResourceKind::Vm);
        let entry = dispatcher.dispatch(&vm, &Action::Stop, true).await;
        assert_eq!(entry.status, ActionStatus::DryRun);
        assert!(entry.message.contains("would stop"));

        let entry = dispatcher.dispatch(&database(20), &scale_action(50), true).await;
        assert_eq!(entry.status, ActionStatus::DryRun);
        assert!(entry.message.contains("from 20 to 50"));
        assert!(provider.mutations().is_empty());
    }

    #[tokio::test]
    async fn unsupported_combination_is_no_action() {
        let provider = Arc::new(FakeProvider::default());
        let ctx = context(provider.clone(), noon());
        let dispatcher = ActionDispatcher::new(&ctx);

        let disk = Resource::new("/disks/d-1", "d-1", ResourceKind::Disk);
        let entry = dispatcher.dispatch(&disk, &Action::Stop, false).await;
        assert_eq!(entry.status, ActionStatus::NoAction);
        assert_eq!(entry.action, ActionKind::Stop);

        let entry = dispatcher.dispatch(&disk, &Action::Stop, true).await;
        assert_eq!(entry.status, ActionStatus::NoAction);
        assert!(provider.mutations().is_empty());
    }

    #[tokio::test]
    async fn stop_skips_deallocated_vm() {
        let provider = Arc::new(FakeProvider {
            power: Some(PowerState::Deallocated),
            ..Default::default()
        });
        let ctx = context(provider.clone(), noon());
        let vm = Resource::new("/vms/vm-1", "vm-1", ResourceKind::Vm);

        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&vm, &Action::Stop, false)
            .await;
        assert_eq!(entry.status, ActionStatus::NoAction);
        assert!(provider.mutations().is_empty());
    }

    #[tokio::test]
    async fn delete_waits_for_terminal_state() {
        let provider = Arc::new(FakeProvider::default());
        provider.statuses.lock().unwrap().extend([
            OperationStatus::Pending,
            OperationStatus::Pending,
            OperationStatus::Failed {
                reason: "ScopeLocked".to_string(),
            },
        ]);
        let ctx = context(provider.clone(), noon());
        let ip = Resource::new("/ips/ip-1", "ip-1", ResourceKind::PublicIp);

        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&ip, &Action::Delete, false)
            .await;
        assert_eq!(entry.status, ActionStatus::Failed);
        assert!(entry.message.contains("ScopeLocked"));
        assert!(provider.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_that_never_finishes_times_out() {
        let provider = Arc::new(FakeProvider::default());
        provider
            .statuses
            .lock()
            .unwrap()
            .extend(std::iter::repeat_n(OperationStatus::Pending, 10_000));
        let ctx = context(provider.clone(), noon());
        let rg = Resource::new("/rgs/rg-1", "rg-1", ResourceKind::ResourceGroup);

        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&rg, &Action::Delete, false)
            .await;
        assert_eq!(entry.status, ActionStatus::Failed);
        assert!(entry.message.contains("did not complete"));
    }

    #[tokio::test]
    async fn provider_error_becomes_failed_entry() {
        let provider = Arc::new(FakeProvider {
            fail_mutate: true,
            ..Default::default()
        });
        let ctx = context(provider, noon());
        let ip = Resource::new("/ips/ip-1", "ip-1", ResourceKind::PublicIp);

        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&ip, &Action::Delete, false)
            .await;
        assert_eq!(entry.status, ActionStatus::Failed);
        assert!(entry.message.contains("429"));
    }

    #[tokio::test]
    async fn update_sku_verifies_result() {
        let provider = Arc::new(FakeProvider::default());
        let ctx = context(provider.clone(), noon());
        let dispatcher = ActionDispatcher::new(&ctx);
        let action = Action::UpdateSku {
            sku: "Standard_LRS".to_string(),
        };

        let entry = dispatcher
            .dispatch(&disk("d1", "Premium_LRS"), &action, false)
            .await;
        assert_eq!(entry.status, ActionStatus::Success);

        let entry = dispatcher
            .dispatch(&disk("d2", "Standard_LRS"), &action, false)
            .await;
        assert_eq!(entry.status, ActionStatus::NoAction);
        assert_eq!(provider.mutations().len(), 1);

        let stubborn = Arc::new(FakeProvider {
            ignore_updates: true,
            ..Default::default()
        });
        let ctx = context(stubborn, noon());
        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&disk("d3", "Premium_LRS"), &action, false)
            .await;
        assert_eq!(entry.status, ActionStatus::Failed);
        assert!(entry.message.contains("expected Standard_LRS"));
    }

    #[tokio::test]
    async fn vm_downgrade_aggregates_disks() {
        let provider = Arc::new(FakeProvider {
            disks: vec![disk("os", "Premium_LRS"), disk("data", "Standard_LRS")],
            ..Default::default()
        });
        let ctx = context(provider.clone(), noon());
        let vm = Resource::new("/vms/vm-1", "vm-1", ResourceKind::Vm);
        let action = Action::Downgrade {
            sku: "Standard_LRS".to_string(),
        };

        let entry = ActionDispatcher::new(&ctx).dispatch(&vm, &action, false).await;
        assert_eq!(entry.status, ActionStatus::Success);
        assert!(entry.message.contains("os"));
        assert_eq!(provider.mutations().len(), 1);

        let settled = Arc::new(FakeProvider {
            disks: vec![disk("os", "Standard_LRS")],
            ..Default::default()
        });
        let ctx = context(settled, noon());
        let entry = ActionDispatcher::new(&ctx).dispatch(&vm, &action, false).await;
        assert_eq!(entry.status, ActionStatus::NoAction);
    }

    #[tokio::test]
    async fn scale_at_target_issues_no_mutation() {
        let provider = Arc::new(FakeProvider {
            valid: vec![10, 20, 50, 100],
            ..Default::default()
        });
        let ctx = context(provider.clone(), noon());

        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&database(50), &scale_action(50), false)
            .await;
        assert_eq!(entry.status, ActionStatus::NoChange);
        assert!(provider.mutations().is_empty());
    }

    #[tokio::test]
    async fn scale_changes_capacity_and_waits() {
        let provider = Arc::new(FakeProvider {
            valid: vec![10, 20, 50, 100],
            ..Default::default()
        });
        let late = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let ctx = context(provider.clone(), late);

        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&database(50), &scale_action(50), false)
            .await;
        assert_eq!(entry.status, ActionStatus::Success, "{}", entry.message);
        assert_eq!(
            provider.mutations(),
            vec![Mutation::ScaleCapacity { capacity: 10 }]
        );
    }

    #[tokio::test]
    async fn invalid_capacity_is_error_without_mutation() {
        let provider = Arc::new(FakeProvider {
            valid: vec![10, 20, 50, 100],
            ..Default::default()
        });
        let ctx = context(provider.clone(), noon());
        let dispatcher = ActionDispatcher::new(&ctx);

        for _ in 0..2 {
            let entry = dispatcher
                .dispatch(&database(20), &scale_action(30), false)
                .await;
            assert_eq!(entry.status, ActionStatus::Error);
            assert!(entry.message.contains("30"));
        }
        assert!(provider.mutations().is_empty());
    }

    #[tokio::test]
    async fn log_action_records_without_mutation() {
        let provider = Arc::new(FakeProvider::default());
        let ctx = context(provider.clone(), noon());
        let gateway = Resource::new("/agw/1", "agw-1", ResourceKind::ApplicationGateway);

        let entry = ActionDispatcher::new(&ctx)
            .dispatch(&gateway, &Action::Log, false)
            .await;
        assert_eq!(entry.status, ActionStatus::Success);
        assert_eq!(entry.scope, "sub-1");
        assert!(provider.mutations().is_empty());
    }
}
