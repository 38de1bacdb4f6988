//! Audit trail of action attempts.
//!
//! Each status log entry is mirrored as an [`AuditEvent`]. Sinks are
//! fire-and-forget: a sink that cannot write logs a warning and the run goes on.

use chrono::{DateTime, Utc};
use frugal_core::{ActionKind, ActionStatus, AuditConfig, StatusLogEntry};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to open audit file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub scope: String,
    pub policy: String,
    pub resource: String,
    pub action: ActionKind,
    pub status: ActionStatus,
    pub message: String,
    pub dry_run: bool,
}

impl AuditEvent {
    pub fn from_entry(
        entry: &StatusLogEntry,
        policy: &str,
        dry_run: bool,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at,
            scope: entry.scope.clone(),
            policy: policy.to_string(),
            resource: entry.resource_name.clone(),
            action: entry.action,
            status: entry.status,
            message: entry.message.clone(),
            dry_run,
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// One human-readable line per event on stdout.
pub struct StdoutAuditSink;

impl AuditSink for StdoutAuditSink {
    fn record(&self, event: AuditEvent) {
        println!(
            "[AUDIT] scope={} policy={} resource={} action={} status={} dry_run={} message={}",
            event.scope,
            event.policy,
            event.resource,
            event.action,
            event.status,
            event.dry_run,
            event.message
        );
    }
}

/// Appends events as JSON Lines.
pub struct JsonLinesAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesAuditSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    fn write(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let line = serde_json::to_string(event)?;
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Err(e) = self.write(&event) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write audit event");
        }
    }
}

/// Discards every event.
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Forwards each event to several sinks.
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutAuditSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

impl AuditSink for FanoutAuditSink {
    fn record(&self, event: AuditEvent) {
        for sink in &self.sinks {
            sink.record(event.clone());
        }
    }
}

/// Build the sink described by the audit configuration.
pub fn create_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, AuditError> {
    if !config.enabled {
        return Ok(Arc::new(NullAuditSink));
    }

    let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();
    if config.stdout {
        sinks.push(Arc::new(StdoutAuditSink));
    }
    if let Some(path) = &config.file {
        sinks.push(Arc::new(JsonLinesAuditSink::open(path)?));
    }

    Ok(match sinks.len() {
        0 => Arc::new(NullAuditSink),
        1 => sinks.remove(0),
        _ => Arc::new(FanoutAuditSink::new(sinks)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entry() -> StatusLogEntry {
        StatusLogEntry::new(
            "sub-1",
            "vm-1",
            ActionKind::Stop,
            ActionStatus::Success,
            "VM stopped successfully.",
        )
    }

    #[test]
    fn json_lines_sink_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = JsonLinesAuditSink::open(&path).unwrap();

        sink.record(AuditEvent::from_entry(&entry(), "stop-idle", false, Utc::now()));
        sink.record(AuditEvent::from_entry(&entry(), "stop-idle", true, Utc::now()));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.policy, "stop-idle");
        assert_eq!(first.status, ActionStatus::Success);
        assert!(!first.dry_run);
        let second: AuditEvent = serde_json::from_str(lines[1]).unwrap();
        assert!(second.dry_run);
        assert_ne!(first.event_id, second.event_id);
    }

    #[test]
    fn disabled_config_builds_null_sink() {
        let config = AuditConfig {
            enabled: false,
            stdout: true,
            file: None,
        };
        let sink = create_sink(&config).unwrap();
        sink.record(AuditEvent::from_entry(&entry(), "p", false, Utc::now()));
    }

    #[test]
    fn file_sink_in_missing_directory_fails() {
        let config = AuditConfig {
            enabled: true,
            stdout: false,
            file: Some(PathBuf::from("/definitely/not/here/audit.jsonl")),
        };
        assert!(matches!(create_sink(&config), Err(AuditError::Open { .. })));
    }
}
