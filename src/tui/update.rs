//! State transitions for the console.
//!
//! [`update`] is the only place `AppModel` changes. It is deterministic and
//! performs no I/O: every side effect leaves as a [`Cmd`] for the runtime.
//! Input goes to the current screen (registered handler first, legacy switch
//! otherwise) and falls back to the global bindings; task completions are
//! applied here regardless of which screen is current.

#![allow(missing_docs)]

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use super::editor::EditKeyOutcome;
use super::handlers::{self, EventResult, ScreenEvent, WHEEL_STEP};
use super::input::{InputAction, InputContext, is_press, resolve_key_event};
use super::layout::is_terminal_too_small;
use super::legacy;
use super::log_buffer::LogBuffer;
use super::model::{
    AppModel, BackupOutcome, BatchReport, Cmd, ErrorReport, ItemProgress, Msg, NotificationLevel,
    OpKind, OpRequest, Screen, StatusReport,
};
use super::widgets;
use crate::backup::store::BackupSnapshot;
use crate::core::errors::DevkitError;
use crate::logger::activity::ActivityEvent;
use crate::platform::pkg::UpgradablePackage;

/// Apply one message to the model.
pub fn update(model: &mut AppModel, msg: Msg) -> Cmd {
    match msg {
        Msg::Key(key) => handle_key(model, &key),
        Msg::Mouse(mouse) => handle_mouse(model, &mouse),
        Msg::Resize(cols, rows) => {
            model.terminal_size = (cols, rows);
            sync_log_viewport(model);
            Cmd::None
        }
        Msg::Tick => on_tick(model),
        Msg::PlatformDetected(info) => {
            model.platform.info = Some(info);
            model.platform.checking = false;
            Cmd::None
        }
        Msg::StatusLoaded(result) => on_status_loaded(model, result),
        Msg::UpdatesChecked(result) => on_updates_checked(model, result),
        Msg::BackupsListed(snapshots) => on_backups_listed(model, snapshots),
        Msg::PrivilegeRequired { op_id } => on_privilege_required(model, op_id),
        Msg::PrivilegeResolved { granted } => on_privilege_resolved(model, granted),
        Msg::OperationStarted {
            op_id,
            kind,
            privileged,
        } => {
            if model.ops.mark_started(op_id, privileged) && privileged {
                model.log.append(format!("{} running with administrator privileges", kind.label()));
            }
            Cmd::None
        }
        Msg::LogLine { op_id, line } => {
            if model.ops.owns(op_id) {
                model.log.append(line);
            }
            Cmd::None
        }
        Msg::ItemStarted {
            op_id,
            progress,
            item,
        } => on_item_started(model, op_id, progress, item),
        Msg::InstallFinished { op_id, report } => on_install_finished(model, op_id, report),
        Msg::UpdateFinished { op_id, report } => on_update_finished(model, op_id, report),
        Msg::BackupFinished { op_id, result } => on_backup_finished(model, op_id, result),
        Msg::ConfigSaved(result) => match result {
            Ok(path) => Cmd::Log(ActivityEvent::ConfigSaved {
                path: path.display().to_string(),
            }),
            Err(err) => {
                model.notify(NotificationLevel::Error, format!("settings not saved: {}", err.message));
                error_event(&err)
            }
        },
    }
}

// ──────────────────── navigation ────────────────────

/// A navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Replace(Screen),
    Push(Screen),
    Back,
    /// Replace and forget all history.
    Reset(Screen),
}

/// Navigate, then run the entry side effects of the new screen.
pub fn go(model: &mut AppModel, nav: Nav) -> Cmd {
    let before = model.screen();
    let changed = match nav {
        Nav::Replace(screen) => model.nav.navigate(screen),
        Nav::Push(screen) => model.nav.navigate_with_push(screen),
        Nav::Back => model.nav.navigate_back() != before,
        Nav::Reset(screen) => {
            model.nav.reset(screen);
            screen != before
        }
    };
    if !changed {
        return Cmd::None;
    }
    enter_screen(model)
}

fn enter_screen(model: &mut AppModel) -> Cmd {
    let screen = model.screen();
    model.editor.retain_for(screen);
    sync_log_viewport(model);
    match handlers::registry().get(screen) {
        Some(handler) => handler.initialize(model),
        None => legacy::on_enter(model),
    }
}

/// Keep the log window height in step with the screen that shows it.
pub fn sync_log_viewport(model: &mut AppModel) {
    let screen = model.screen();
    if !matches!(screen, Screen::Installing | Screen::UpdateProgress | Screen::Logs) {
        return;
    }
    let rect = widgets::log_viewport(screen, model.layout().body);
    model.log.set_visible(usize::from(rect.height));
}

// ──────────────────── input ────────────────────

fn handle_key(model: &mut AppModel, key: &KeyEvent) -> Cmd {
    if !is_press(key) {
        return Cmd::None;
    }
    let context = InputContext {
        screen: model.screen(),
        editing: model.editor.is_active(),
    };
    let resolution = resolve_key_event(key, context);
    if resolution.preempts {
        return resolution.action.map_or(Cmd::None, |a| apply_global(model, a));
    }
    if model.screen() == Screen::Intro {
        return go(model, Nav::Replace(Screen::Welcome));
    }
    if model.editor.is_active() {
        return handle_edit_key(model, key);
    }
    match dispatch_screen(model, &ScreenEvent::Key(key)) {
        EventResult::Consumed(cmd) => cmd,
        EventResult::Ignored => resolution.action.map_or(Cmd::None, |a| apply_global(model, a)),
    }
}

fn handle_edit_key(model: &mut AppModel, key: &KeyEvent) -> Cmd {
    match model.editor.apply_key(key) {
        EditKeyOutcome::Commit => {
            if model.editor.commit(&mut model.config).is_some() {
                persist_config(model)
            } else {
                Cmd::None
            }
        }
        EditKeyOutcome::Cancel => {
            model.editor.cancel();
            Cmd::None
        }
        EditKeyOutcome::Edited | EditKeyOutcome::Inactive => Cmd::None,
    }
}

fn handle_mouse(model: &mut AppModel, mouse: &MouseEvent) -> Cmd {
    if !model.config.console.mouse || model.editor.is_active() {
        return Cmd::None;
    }
    if is_terminal_too_small(model.terminal_size.0, model.terminal_size.1) {
        return Cmd::None;
    }
    let (col, row) = (mouse.column, mouse.row);
    let event = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => ScreenEvent::Click { col, row },
        MouseEventKind::ScrollUp => ScreenEvent::Wheel {
            col,
            row,
            delta: -WHEEL_STEP,
        },
        MouseEventKind::ScrollDown => ScreenEvent::Wheel {
            col,
            row,
            delta: WHEEL_STEP,
        },
        _ => return Cmd::None,
    };
    match dispatch_screen(model, &event) {
        EventResult::Consumed(cmd) => cmd,
        EventResult::Ignored => Cmd::None,
    }
}

/// Registry first, legacy switch otherwise.
fn dispatch_screen(model: &mut AppModel, event: &ScreenEvent<'_>) -> EventResult {
    match handlers::registry().get(model.screen()) {
        Some(handler) => handler.update(model, event),
        None => legacy::handle(model, event),
    }
}

fn apply_global(model: &mut AppModel, action: InputAction) -> Cmd {
    match action {
        InputAction::ForceQuit | InputAction::Quit => request_quit(model),
        InputAction::Back => go(model, Nav::Back),
        InputAction::Navigate(screen) => go(model, Nav::Push(screen)),
    }
}

/// Quit unless a privileged operation is mid-flight.
pub fn request_quit(model: &mut AppModel) -> Cmd {
    if model.ops.privileged_running() {
        model.notify(
            NotificationLevel::Warning,
            "a privileged operation is running; quit when it finishes",
        );
        return Cmd::None;
    }
    model.quit = true;
    Cmd::Quit
}

fn on_tick(model: &mut AppModel) -> Cmd {
    model.tick = model.tick.wrapping_add(1);
    model.age_notifications();
    if model.screen() == Screen::Intro {
        model.intro_ticks_left = model.intro_ticks_left.saturating_sub(1);
        if model.intro_ticks_left == 0 {
            return go(model, Nav::Replace(Screen::Welcome));
        }
    }
    Cmd::None
}

// ──────────────────── operations ────────────────────

/// Snapshot the config for a background save.
#[must_use]
pub fn persist_config(model: &AppModel) -> Cmd {
    Cmd::SaveConfig(Box::new(model.config.clone()))
}

/// Reserve the single-flight slot and launch `request`.
///
/// Returns `None` (and leaves every buffer untouched) when another operation
/// holds the slot.
pub fn start_operation(model: &mut AppModel, request: OpRequest) -> Option<Cmd> {
    let kind = request.kind();
    let items = request.item_count();
    let streams = request.needs_privilege();
    let Some(op_id) = model.ops.reserve(request.clone()) else {
        let busy = model
            .ops
            .running()
            .map(|r| r.kind)
            .or_else(|| model.ops.pending().map(|p| p.request.kind()))
            .map_or("another", OpKind::label);
        model.notify(
            NotificationLevel::Warning,
            format!("{busy} already in progress; try again when it finishes"),
        );
        return None;
    };
    if streams {
        reset_log(model);
    }
    Some(Cmd::batch([
        Cmd::Launch {
            op_id,
            request,
            skip_privilege_check: false,
        },
        Cmd::Log(ActivityEvent::OperationStarted {
            operation: kind.label().to_string(),
            items,
        }),
    ]))
}

/// Fresh transcript for a new streaming operation, honouring capacity changes.
fn reset_log(model: &mut AppModel) {
    let capacity = model.config.console.log_capacity.max(1);
    if model.log.capacity() == capacity {
        model.log.clear();
    } else {
        model.log = LogBuffer::new(capacity);
        sync_log_viewport(model);
    }
}

fn error_event(err: &ErrorReport) -> Cmd {
    Cmd::Log(ActivityEvent::Error {
        code: err.code.to_string(),
        message: err.message.clone(),
    })
}

fn finished_event(kind: OpKind, report: &BatchReport) -> Cmd {
    Cmd::Log(ActivityEvent::OperationFinished {
        operation: kind.label().to_string(),
        succeeded: report.succeeded.len(),
        failed: report.failed.len(),
        duration_ms: report.duration_ms,
        error_code: report.first_error_code(),
    })
}

fn on_privilege_required(model: &mut AppModel, op_id: u64) -> Cmd {
    if !model.ops.await_privilege(op_id) {
        return Cmd::None;
    }
    model
        .log
        .append("administrator privileges required; prompting for the sudo password");
    Cmd::Escalate
}

fn on_privilege_resolved(model: &mut AppModel, granted: bool) -> Cmd {
    let Some(pending) = model.ops.pending().filter(|p| p.awaiting_privilege).cloned() else {
        return Cmd::None;
    };
    let kind = pending.request.kind();
    let resolved = Cmd::Log(ActivityEvent::PrivilegeResolved {
        operation: kind.label().to_string(),
        granted,
    });
    if granted {
        model.log.append("sudo credentials accepted");
        return Cmd::batch([
            Cmd::Launch {
                op_id: pending.op_id,
                request: pending.request,
                skip_privilege_check: true,
            },
            resolved,
        ]);
    }

    model.ops.abort_pending();
    let report = ErrorReport::from(DevkitError::PrivilegeDenied {
        operation: kind.label().to_string(),
    });
    model.log.append(report.message.clone());
    let logged = error_event(&report);
    let routed = match kind {
        OpKind::Install => {
            model.install.progress = None;
            model.install.error = Some(report.clone());
            model.install.report = Some(BatchReport::fatal(report));
            go(model, Nav::Replace(Screen::InstallError))
        }
        OpKind::Update => {
            model.update.progress = None;
            model.notify(NotificationLevel::Error, report.message.clone());
            model.update.report = Some(BatchReport::fatal(report));
            Cmd::None
        }
        OpKind::Backup => {
            model.notify(NotificationLevel::Error, report.message);
            Cmd::None
        }
    };
    Cmd::batch([resolved, logged, routed])
}

fn on_item_started(model: &mut AppModel, op_id: u64, progress: ItemProgress, item: String) -> Cmd {
    if !model.ops.owns(op_id) {
        return Cmd::None;
    }
    model
        .log
        .append(format!("==> [{}/{}] {item}", progress.index + 1, progress.total));
    match model.ops.running().map(|r| r.kind) {
        Some(OpKind::Install) => model.install.progress = Some((progress, item)),
        Some(OpKind::Update) => model.update.progress = Some((progress, item)),
        _ => {}
    }
    Cmd::None
}

fn on_install_finished(model: &mut AppModel, op_id: u64, report: BatchReport) -> Cmd {
    model.ops.finish(op_id);
    if !report.succeeded.is_empty() {
        model.status.invalidate();
    }
    for tool in &report.succeeded {
        model.install.selected.remove(tool);
    }
    model.install.progress = None;
    let logged = finished_event(OpKind::Install, &report);
    let fatal = report.fatal.clone();
    let summary = format!(
        "install finished: {} installed, {} failed, {} skipped",
        report.succeeded.len(),
        report.failed.len(),
        report.skipped.len()
    );
    model.install.report = Some(report);
    model.install.error.clone_from(&fatal);

    let routed = if model.screen() == Screen::Installing {
        let next = if fatal.is_some() {
            Screen::InstallError
        } else {
            Screen::InstallSummary
        };
        go(model, Nav::Replace(next))
    } else {
        let level = if fatal.is_some() {
            NotificationLevel::Error
        } else {
            NotificationLevel::Info
        };
        model.notify(level, summary);
        Cmd::None
    };
    Cmd::batch([logged, routed])
}

/// Item name the executor reports for a whole-system upgrade.
pub const UPDATE_ALL_ITEM: &str = "all packages";

fn on_update_finished(model: &mut AppModel, op_id: u64, report: BatchReport) -> Cmd {
    model.ops.finish(op_id);
    if !report.succeeded.is_empty() {
        model.status.invalidate();
    }
    if report.succeeded.iter().any(|s| s == UPDATE_ALL_ITEM) {
        model.update.packages.clear();
    } else {
        model
            .update
            .packages
            .retain(|p| !report.succeeded.contains(&p.name));
    }
    let packages = &model.update.packages;
    model
        .update
        .selected
        .retain(|name| packages.iter().any(|p| &p.name == name));
    let visible = model.layout().list_visible_rows();
    model.update.list.clamp(model.update.packages.len(), visible);
    model.update.progress = None;

    let (level, message) = match &report.fatal {
        Some(err) => (NotificationLevel::Error, err.message.clone()),
        None if report.failed.is_empty() => (
            NotificationLevel::Info,
            format!("updated {} item(s)", report.succeeded.len()),
        ),
        None => (
            NotificationLevel::Warning,
            format!("{} updated, {} failed", report.succeeded.len(), report.failed.len()),
        ),
    };
    model.notify(level, message);
    let logged = finished_event(OpKind::Update, &report);
    model.update.report = Some(report);
    logged
}

fn on_backup_finished(
    model: &mut AppModel,
    op_id: u64,
    result: Result<BackupOutcome, ErrorReport>,
) -> Cmd {
    let duration_ms = model
        .ops
        .finish(op_id)
        .map_or(0, |r| u64::try_from(r.started.elapsed().as_millis()).unwrap_or(u64::MAX));
    let (level, message, event, ok) = match result {
        Ok(BackupOutcome::Created {
            id,
            files,
            skipped,
            failed,
            pruned,
        }) => {
            let mut message = format!("snapshot {id} created with {files} file(s)");
            if skipped > 0 {
                message.push_str(&format!(", {skipped} missing"));
            }
            if !failed.is_empty() {
                message.push_str(&format!(", {} failed", failed.len()));
            }
            if !pruned.is_empty() {
                message.push_str(&format!(", pruned {}", pruned.len()));
            }
            let level = if failed.is_empty() {
                NotificationLevel::Info
            } else {
                NotificationLevel::Warning
            };
            (level, message, ActivityEvent::BackupCreated { id, files }, true)
        }
        Ok(BackupOutcome::Restored(report)) => {
            let level = if report.failed.is_empty() {
                NotificationLevel::Info
            } else {
                NotificationLevel::Warning
            };
            let message = format!(
                "restored {} file(s) from {} ({} failed)",
                report.restored,
                report.id,
                report.failed.len()
            );
            let event = ActivityEvent::BackupRestored {
                id: report.id,
                files: report.restored,
                failed: report.failed.len(),
            };
            (level, message, event, true)
        }
        Ok(BackupOutcome::Deleted { id }) => (
            NotificationLevel::Info,
            format!("snapshot {id} deleted"),
            ActivityEvent::BackupDeleted { id },
            true,
        ),
        Err(err) => (
            NotificationLevel::Error,
            err.message.clone(),
            ActivityEvent::Error {
                code: err.code.to_string(),
                message: err.message,
            },
            false,
        ),
    };
    model.notify(level, message.clone());
    model.backups.last_message = Some(message);
    model.backups.loading = true;
    Cmd::batch([
        Cmd::Log(event),
        Cmd::Log(ActivityEvent::OperationFinished {
            operation: OpKind::Backup.label().to_string(),
            succeeded: usize::from(ok),
            failed: usize::from(!ok),
            duration_ms,
            error_code: None,
        }),
        Cmd::ListBackups,
    ])
}

// ──────────────────── loads ────────────────────

fn on_status_loaded(model: &mut AppModel, result: Result<StatusReport, ErrorReport>) -> Cmd {
    let logged = result.as_ref().err().map_or(Cmd::None, error_event);
    model.status.apply(result);
    let visible = model.layout().list_visible_rows();
    let count = model.registry.len();
    model.install.list.clamp(count, visible);
    model.status_view.clamp(count, visible);
    logged
}

fn on_updates_checked(
    model: &mut AppModel,
    result: Result<Vec<UpgradablePackage>, ErrorReport>,
) -> Cmd {
    model.update.loading = false;
    match result {
        Ok(packages) => {
            model.update.error = None;
            model
                .update
                .selected
                .retain(|name| packages.iter().any(|p| &p.name == name));
            model.update.packages = packages;
            let visible = model.layout().list_visible_rows();
            model.update.list.clamp(model.update.packages.len(), visible);
            Cmd::None
        }
        Err(err) => {
            let logged = error_event(&err);
            model.update.error = Some(err);
            logged
        }
    }
}

fn on_backups_listed(model: &mut AppModel, snapshots: Vec<BackupSnapshot>) -> Cmd {
    model.backups.loading = false;
    model.backups.snapshots = snapshots;
    let visible = model.layout().list_visible_rows();
    model.backups.list.clamp(model.backups.snapshots.len(), visible);
    Cmd::None
}
