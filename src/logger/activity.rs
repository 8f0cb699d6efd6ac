//! Background activity logger.
//!
//! A dedicated logger thread owns the [`JsonlWriter`]. Every other thread sends
//! [`ActivityEvent`] values through a bounded crossbeam channel; `try_send()`
//! keeps the dispatch loop from ever blocking on log I/O.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::errors::{DevkitError, Result};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Default bounded channel capacity for log events.
const CHANNEL_CAPACITY: usize = 512;

/// Events recorded by the console session.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    SessionStarted {
        version: String,
    },
    SessionStopped {
        uptime_secs: u64,
    },
    ConfigFallback {
        code: String,
        message: String,
    },
    ConfigSaved {
        path: String,
    },
    OperationStarted {
        operation: String,
        items: usize,
    },
    OperationFinished {
        operation: String,
        succeeded: usize,
        failed: usize,
        duration_ms: u64,
        error_code: Option<String>,
    },
    PrivilegeResolved {
        operation: String,
        granted: bool,
    },
    ToolSkipped {
        tool: String,
        reason: String,
    },
    BackupCreated {
        id: String,
        files: usize,
    },
    BackupRestored {
        id: String,
        files: usize,
        failed: usize,
    },
    BackupDeleted {
        id: String,
    },
    Error {
        code: String,
        message: String,
    },
    /// Sentinel to request graceful shutdown of the logger thread.
    Shutdown,
}

/// Cheaply-cloneable handle for sending log events.
#[derive(Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Handle whose receiver is already gone; every event is silently dropped.
    #[must_use]
    pub fn disconnected() -> Self {
        let (tx, _rx) = bounded(1);
        Self {
            tx,
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Send an event to the logger thread. Non-blocking.
    ///
    /// If the channel is full the event is dropped and counted.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of events dropped due to channel back-pressure.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Ask the logger thread to flush and exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ActivityEvent::Shutdown);
    }
}

/// Spawn the logger thread writing to `path`.
pub fn spawn_logger(path: PathBuf) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(CHANNEL_CAPACITY);
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: dropped,
    };

    let join = thread::Builder::new()
        .name("devkit-logger".to_string())
        .spawn(move || logger_thread_main(&rx, JsonlConfig::new(path), &dropped_clone))
        .map_err(|e| DevkitError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

fn logger_thread_main(rx: &Receiver<ActivityEvent>, config: JsonlConfig, dropped: &AtomicU64) {
    let mut jsonl = JsonlWriter::open(config);

    while let Ok(event) = rx.recv() {
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let mut warn = LogEntry::new(EventType::Error, Severity::Warning);
            warn.details = Some(format!("{d} log events dropped due to back-pressure"));
            jsonl.write_entry(&warn);
        }

        if matches!(event, ActivityEvent::Shutdown) {
            break;
        }
        jsonl.write_entry(&event_to_log_entry(&event));
    }

    jsonl.flush();
}

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::SessionStarted { version } => {
            let mut e = LogEntry::new(EventType::SessionStart, Severity::Info);
            e.details = Some(format!("version={version}"));
            e
        }
        ActivityEvent::SessionStopped { uptime_secs } => {
            let mut e = LogEntry::new(EventType::SessionStop, Severity::Info);
            e.details = Some(format!("uptime={uptime_secs}s"));
            e
        }
        ActivityEvent::ConfigFallback { code, message } => {
            let mut e = LogEntry::new(EventType::ConfigFallback, Severity::Warning);
            e.error_code = Some(code.clone());
            e.details = Some(message.clone());
            e
        }
        ActivityEvent::ConfigSaved { path } => {
            let mut e = LogEntry::new(EventType::ConfigSaved, Severity::Info);
            e.subject = Some(path.clone());
            e
        }
        ActivityEvent::OperationStarted { operation, items } => {
            let mut e = LogEntry::new(EventType::OperationStarted, Severity::Info);
            e.operation = Some(operation.clone());
            e.details = Some(format!("items={items}"));
            e
        }
        ActivityEvent::OperationFinished {
            operation,
            succeeded,
            failed,
            duration_ms,
            error_code,
        } => {
            let severity = if error_code.is_some() {
                Severity::Error
            } else if *failed > 0 {
                Severity::Warning
            } else {
                Severity::Info
            };
            let mut e = LogEntry::new(EventType::OperationFinished, severity);
            e.operation = Some(operation.clone());
            e.succeeded = Some(*succeeded);
            e.failed = Some(*failed);
            e.duration_ms = Some(*duration_ms);
            e.error_code.clone_from(error_code);
            e
        }
        ActivityEvent::PrivilegeResolved { operation, granted } => {
            let (event, severity) = if *granted {
                (EventType::PrivilegeGranted, Severity::Info)
            } else {
                (EventType::PrivilegeDenied, Severity::Warning)
            };
            let mut e = LogEntry::new(event, severity);
            e.operation = Some(operation.clone());
            e
        }
        ActivityEvent::ToolSkipped { tool, reason } => {
            let mut e = LogEntry::new(EventType::ToolSkipped, Severity::Warning);
            e.subject = Some(tool.clone());
            e.details = Some(reason.clone());
            e
        }
        ActivityEvent::BackupCreated { id, files } => {
            let mut e = LogEntry::new(EventType::BackupCreated, Severity::Info);
            e.subject = Some(id.clone());
            e.succeeded = Some(*files);
            e
        }
        ActivityEvent::BackupRestored { id, files, failed } => {
            let severity = if *failed > 0 {
                Severity::Warning
            } else {
                Severity::Info
            };
            let mut e = LogEntry::new(EventType::BackupRestored, severity);
            e.subject = Some(id.clone());
            e.succeeded = Some(*files);
            e.failed = Some(*failed);
            e
        }
        ActivityEvent::BackupDeleted { id } => {
            let mut e = LogEntry::new(EventType::BackupDeleted, Severity::Info);
            e.subject = Some(id.clone());
            e
        }
        ActivityEvent::Error { code, message } => {
            let mut e = LogEntry::new(EventType::Error, Severity::Error);
            e.error_code = Some(code.clone());
            e.details = Some(message.clone());
            e
        }
        ActivityEvent::Shutdown => LogEntry::new(EventType::SessionStop, Severity::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_thread_writes_events_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let (handle, join) = spawn_logger(path.clone()).unwrap();

        handle.send(ActivityEvent::SessionStarted {
            version: "0.1.0".into(),
        });
        handle.send(ActivityEvent::OperationFinished {
            operation: "install".into(),
            succeeded: 3,
            failed: 1,
            duration_ms: 1200,
            error_code: None,
        });
        handle.shutdown();
        join.join().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "session_start");
        assert_eq!(lines[1]["severity"], "warning");
        assert_eq!(lines[1]["failed"], 1);
    }

    #[test]
    fn disconnected_handle_swallows_events() {
        let handle = ActivityLoggerHandle::disconnected();
        handle.send(ActivityEvent::BackupDeleted { id: "1".into() });
        assert_eq!(handle.dropped_events(), 0);
    }

    #[test]
    fn denied_privilege_maps_to_warning() {
        let entry = event_to_log_entry(&ActivityEvent::PrivilegeResolved {
            operation: "update".into(),
            granted: false,
        });
        assert_eq!(entry.event, EventType::PrivilegeDenied);
        assert_eq!(entry.severity, Severity::Warning);
    }
}
