//! Background tasks. Each spawned task reports exactly one completion message.
//!
//! Work runs on named OS threads; a panic inside the work closure is caught
//! and converted into the task's failure message so the dispatch loop never
//! waits on a completion that will not arrive.

#![allow(missing_docs)]

use std::any::Any;
use std::env;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::Sender;

use super::executor::{self, OperationContext};
use super::model::{ErrorReport, Msg, OpRequest, StatusReport};
use crate::backup::store::BackupStore;
use crate::core::config::Config;
use crate::core::errors::{DevkitError, Result};
use crate::platform::pkg::{PackageManager, PlatformInfo};
use crate::tools::registry::ToolRegistry;

/// Spawns task threads that report back on the message channel.
#[derive(Clone)]
pub struct TaskRunner {
    tx: Sender<Msg>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskRunner {
    #[must_use]
    pub fn new(tx: Sender<Msg>) -> Self {
        Self {
            tx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Tasks started and not yet reported.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run `work` on a new thread and send its completion.
    ///
    /// `on_failure` builds the completion when the work panics or the thread
    /// cannot be spawned.
    pub fn spawn<W, F>(&self, name: &str, work: W, on_failure: F)
    where
        W: FnOnce(&Sender<Msg>) -> Msg + Send + 'static,
        F: FnOnce(ErrorReport) -> Msg + Send + 'static,
    {
        let tx = self.tx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let task = name.to_string();
        // Shared so whichever side ends up holding it can build the failure.
        let on_failure = Arc::new(parking_lot::Mutex::new(Some(on_failure)));
        let fallback = Arc::clone(&on_failure);
        in_flight.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("devkit-{name}"))
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&tx)));
                let msg = match outcome {
                    Ok(msg) => Some(msg),
                    Err(payload) => {
                        let report = ErrorReport::panicked(&task, &panic_message(payload.as_ref()));
                        on_failure.lock().take().map(|build| build(report))
                    }
                };
                if let Some(msg) = msg {
                    let _ = tx.send(msg);
                }
                // After the send: a settled runner never has a completion in transit.
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(source) = spawned {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let report = ErrorReport::from(DevkitError::Runtime {
                details: format!("failed to spawn {name} task: {source}"),
            });
            if let Some(build) = fallback.lock().take() {
                let _ = self.tx.send(build(report));
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ──────────────────── task bodies ────────────────────

pub fn detect_platform(runner: &TaskRunner, pm: Arc<dyn PackageManager>) {
    runner.spawn(
        "platform",
        move |_| Msg::PlatformDetected(pm.platform()),
        |_| {
            Msg::PlatformDetected(PlatformInfo {
                os: env::consts::OS.to_string(),
                distro: None,
                arch: env::consts::ARCH.to_string(),
                manager: None,
            })
        },
    );
}

pub fn load_status(runner: &TaskRunner, pm: Arc<dyn PackageManager>, registry: ToolRegistry) {
    runner.spawn(
        "status",
        move |_| Msg::StatusLoaded(scan_status(pm.as_ref(), registry).map_err(ErrorReport::from)),
        |err| Msg::StatusLoaded(Err(err)),
    );
}

/// Installed map for every registered tool.
pub fn scan_status(pm: &dyn PackageManager, registry: ToolRegistry) -> Result<StatusReport> {
    let manager = pm.detect().ok_or(DevkitError::NoPackageManagerDetected)?;
    let packages = pm.list_installed()?;
    Ok(StatusReport {
        manager: Some(manager),
        installed: registry.installed_map(manager, &packages),
    })
}

pub fn check_updates(runner: &TaskRunner, pm: Arc<dyn PackageManager>) {
    runner.spawn(
        "updates",
        move |_| Msg::UpdatesChecked(pm.list_upgradable().map_err(ErrorReport::from)),
        |err| Msg::UpdatesChecked(Err(err)),
    );
}

pub fn list_backups(runner: &TaskRunner, store: BackupStore) {
    runner.spawn(
        "backups",
        move |_| Msg::BackupsListed(store.list()),
        |_| Msg::BackupsListed(Vec::new()),
    );
}

pub fn save_config(runner: &TaskRunner, config: Config) {
    runner.spawn(
        "config",
        move |_| Msg::ConfigSaved(config.save().map_err(ErrorReport::from)),
        |err| Msg::ConfigSaved(Err(err)),
    );
}

pub fn launch(
    runner: &TaskRunner,
    op_id: u64,
    request: OpRequest,
    ctx: OperationContext,
    skip_privilege_check: bool,
) {
    let kind = request.kind();
    runner.spawn(
        kind.label(),
        move |tx| executor::run_operation(op_id, &request, &ctx, skip_privilege_check, tx),
        move |err| executor::failed_completion(op_id, kind, err),
    );
}
