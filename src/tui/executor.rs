//! Worker-side execution of install, update and backup operations.
//!
//! [`run_operation`] runs on a task thread. Progress leaves through the
//! message channel as it happens (`OperationStarted`, `ItemStarted`,
//! `LogLine`); the returned [`Msg`] is the operation's single completion.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;

use super::model::{BackupOutcome, BatchReport, ErrorReport, ItemFailure, ItemProgress, Msg, OpKind, OpRequest};
use super::update::UPDATE_ALL_ITEM;
use crate::backup::store::BackupStore;
use crate::core::config::Config;
use crate::core::errors::{DevkitError, Result};
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::platform::pkg::{PackageManager, StreamingCommand};
use crate::tools::registry::ToolRegistry;

/// Backup settings captured when an operation launches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub keep: usize,
}

impl BackupPlan {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            dir: config.paths.backup_dir.clone(),
            files: config.resolved_tracked_files(),
            keep: config.backup.max_backups,
        }
    }
}

/// Collaborators an operation needs on the worker thread.
#[derive(Clone)]
pub struct OperationContext {
    pub pm: Arc<dyn PackageManager>,
    pub registry: ToolRegistry,
    pub backups: BackupPlan,
    pub logger: ActivityLoggerHandle,
}

/// Run one operation to completion.
///
/// Mutations that need sudo stop before doing anything and report
/// `PrivilegeRequired` unless `skip_privilege_check` is set (credentials were
/// just refreshed in the foreground).
pub fn run_operation(
    op_id: u64,
    request: &OpRequest,
    ctx: &OperationContext,
    skip_privilege_check: bool,
    tx: &Sender<Msg>,
) -> Msg {
    let kind = request.kind();
    let privileged = request.needs_privilege() && ctx.pm.needs_sudo();
    if privileged && !skip_privilege_check && !ctx.pm.sudo_cached() {
        return Msg::PrivilegeRequired { op_id };
    }
    let _ = tx.send(Msg::OperationStarted {
        op_id,
        kind,
        privileged,
    });

    match request {
        OpRequest::Install { tools } => Msg::InstallFinished {
            op_id,
            report: run_install(op_id, tools, ctx, tx),
        },
        OpRequest::UpdateSelected { packages } => Msg::UpdateFinished {
            op_id,
            report: run_update(op_id, Some(packages), ctx, tx),
        },
        OpRequest::UpdateAll => Msg::UpdateFinished {
            op_id,
            report: run_update(op_id, None, ctx, tx),
        },
        OpRequest::CreateBackup | OpRequest::RestoreBackup { .. } | OpRequest::DeleteBackup { .. } => {
            Msg::BackupFinished {
                op_id,
                result: run_backup(request, &ctx.backups).map_err(ErrorReport::from),
            }
        }
    }
}

/// Completion for an operation whose worker died before reporting.
#[must_use]
pub fn failed_completion(op_id: u64, kind: OpKind, error: ErrorReport) -> Msg {
    match kind {
        OpKind::Install => Msg::InstallFinished {
            op_id,
            report: BatchReport::fatal(error),
        },
        OpKind::Update => Msg::UpdateFinished {
            op_id,
            report: BatchReport::fatal(error),
        },
        OpKind::Backup => Msg::BackupFinished {
            op_id,
            result: Err(error),
        },
    }
}

fn run_install(op_id: u64, tools: &[String], ctx: &OperationContext, tx: &Sender<Msg>) -> BatchReport {
    let started = Instant::now();
    let mut report = BatchReport::default();
    let Some(manager) = ctx.pm.detect() else {
        report.fatal = Some(ErrorReport::from(DevkitError::NoPackageManagerDetected));
        report.duration_ms = elapsed_ms(started);
        return report;
    };

    let total = tools.len();
    for (index, id) in tools.iter().enumerate() {
        let tool = match ctx.registry.get(id) {
            Ok(tool) => tool,
            Err(err) => {
                skip(ctx, &mut report, id, &err.to_string());
                continue;
            }
        };
        let Some(packages) = tool.packages_for(manager) else {
            let reason = format!("no {} package", manager.label());
            skip(ctx, &mut report, id, &reason);
            continue;
        };
        let _ = tx.send(Msg::ItemStarted {
            op_id,
            progress: ItemProgress { index, total },
            item: id.clone(),
        });
        let packages: Vec<String> = packages.iter().map(|p| (*p).to_string()).collect();
        if !record(&mut report, id, stream(op_id, ctx.pm.install_streaming(&packages), tx)) {
            break;
        }
    }
    report.duration_ms = elapsed_ms(started);
    report
}

fn run_update(
    op_id: u64,
    packages: Option<&Vec<String>>,
    ctx: &OperationContext,
    tx: &Sender<Msg>,
) -> BatchReport {
    let started = Instant::now();
    let mut report = BatchReport::default();
    if ctx.pm.detect().is_none() {
        report.fatal = Some(ErrorReport::from(DevkitError::NoPackageManagerDetected));
        report.duration_ms = elapsed_ms(started);
        return report;
    }

    match packages {
        None => {
            let _ = tx.send(Msg::ItemStarted {
                op_id,
                progress: ItemProgress { index: 0, total: 1 },
                item: UPDATE_ALL_ITEM.to_string(),
            });
            record(&mut report, UPDATE_ALL_ITEM, stream(op_id, ctx.pm.update_all_streaming(), tx));
        }
        Some(packages) => {
            let total = packages.len();
            for (index, name) in packages.iter().enumerate() {
                let _ = tx.send(Msg::ItemStarted {
                    op_id,
                    progress: ItemProgress { index, total },
                    item: name.clone(),
                });
                let single = std::slice::from_ref(name);
                if !record(&mut report, name, stream(op_id, ctx.pm.update_streaming(single), tx)) {
                    break;
                }
            }
        }
    }
    report.duration_ms = elapsed_ms(started);
    report
}

fn run_backup(request: &OpRequest, plan: &BackupPlan) -> Result<BackupOutcome> {
    let store = BackupStore::open(plan.dir.clone());
    match request {
        OpRequest::CreateBackup => {
            let created = store.create(&plan.files)?;
            let pruned = store.prune(plan.keep.max(1))?;
            Ok(BackupOutcome::Created {
                id: created.snapshot.id,
                files: created.snapshot.file_count,
                skipped: created.skipped.len(),
                failed: created.failed,
                pruned: pruned.removed_ids,
            })
        }
        OpRequest::RestoreBackup { id } => store.restore(id).map(BackupOutcome::Restored),
        OpRequest::DeleteBackup { id } => {
            store.delete(id)?;
            Ok(BackupOutcome::Deleted { id: id.clone() })
        }
        other => Err(DevkitError::Runtime {
            details: format!("{} is not a backup operation", other.kind().label()),
        }),
    }
}

/// Forward every output line, then wait for the exit status.
fn stream(op_id: u64, command: Result<StreamingCommand>, tx: &Sender<Msg>) -> Result<()> {
    let command = command?;
    for line in command.lines.iter() {
        // A closed receiver means the console is shutting down; keep draining
        // so the child never blocks on a full pipe.
        let _ = tx.send(Msg::LogLine { op_id, line });
    }
    command.wait()
}

/// Tally one item. Returns `false` when the batch must stop.
fn record(report: &mut BatchReport, item: &str, outcome: Result<()>) -> bool {
    match outcome {
        Ok(()) => {
            report.succeeded.push(item.to_string());
            true
        }
        Err(err) if err.is_batch_fatal() => {
            report.fatal = Some(ErrorReport::from(&err));
            false
        }
        Err(err) => {
            report.failed.push(ItemFailure {
                item: item.to_string(),
                error: ErrorReport::from(&err),
            });
            true
        }
    }
}

fn skip(ctx: &OperationContext, report: &mut BatchReport, tool: &str, reason: &str) {
    ctx.logger.send(ActivityEvent::ToolSkipped {
        tool: tool.to_string(),
        reason: reason.to_string(),
    });
    report.skipped.push(tool.to_string());
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
