//! Console state model: screens, sub-states, messages and commands.
//!
//! [`AppModel`] is owned by the dispatch loop and composed of independent
//! sub-states. Background work never touches it; workers report through
//! [`Msg`] values and the loop applies them in [`super::update::update`].

#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::{KeyEvent, MouseEvent};

use super::editor::TextEditor;
use super::layout::{DualPaneLayout, PaneFocus};
use super::log_buffer::LogBuffer;
use super::navigation::Navigation;
use super::theme::ThemePalette;
use super::viewport::ListState;
use crate::backup::store::{BackupSnapshot, FileFailure, RestoreReport};
use crate::core::config::Config;
use crate::core::errors::DevkitError;
use crate::logger::activity::ActivityEvent;
use crate::platform::pkg::{ManagerKind, PlatformInfo, UpgradablePackage};
use crate::tools::registry::ToolRegistry;
use crate::tools::targets::ConfigTarget;

/// Maximum notifications kept in the footer at once.
pub const MAX_NOTIFICATIONS: usize = 3;
/// Ticks a notification stays visible.
pub const NOTIFICATION_TTL_TICKS: u32 = 60;

// ──────────────────── screens ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenFamily {
    Wizard,
    Configuration,
    Management,
}

/// Every view the console can show. Exactly one is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Intro,
    Welcome,
    PlatformCheck,
    ToolSelect,
    ConfirmInstall,
    Installing,
    InstallSummary,
    InstallError,
    MainMenu,
    Status,
    Updates,
    UpdateProgress,
    Backups,
    Profiles,
    Settings,
    Logs,
    Help,
    About,
    Configure(ConfigTarget),
}

impl Screen {
    #[must_use]
    pub const fn family(self) -> ScreenFamily {
        match self {
            Self::Intro
            | Self::Welcome
            | Self::PlatformCheck
            | Self::ToolSelect
            | Self::ConfirmInstall
            | Self::Installing
            | Self::InstallSummary
            | Self::InstallError => ScreenFamily::Wizard,
            Self::Configure(_) => ScreenFamily::Configuration,
            _ => ScreenFamily::Management,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Intro => "devkit",
            Self::Welcome => "Welcome",
            Self::PlatformCheck => "Platform check",
            Self::ToolSelect => "Select tools",
            Self::ConfirmInstall => "Confirm install",
            Self::Installing => "Installing",
            Self::InstallSummary => "Install summary",
            Self::InstallError => "Install failed",
            Self::MainMenu => "Main menu",
            Self::Status => "Tool status",
            Self::Updates => "Updates",
            Self::UpdateProgress => "Updating",
            Self::Backups => "Backups",
            Self::Profiles => "Profiles",
            Self::Settings => "Settings",
            Self::Logs => "Operation log",
            Self::Help => "Help",
            Self::About => "About",
            Self::Configure(_) => "Configure",
        }
    }

    /// Screens drawn with the list/detail layout.
    #[must_use]
    pub const fn is_dual_pane(self) -> bool {
        matches!(
            self,
            Self::ToolSelect
                | Self::MainMenu
                | Self::Status
                | Self::Updates
                | Self::Backups
                | Self::Profiles
                | Self::Settings
                | Self::Configure(_)
        )
    }
}

// ──────────────────── operations ────────────────────

/// Single-flight operation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Install,
    Update,
    Backup,
}

impl OpKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Backup => "backup",
        }
    }
}

/// What an operation should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpRequest {
    Install { tools: Vec<String> },
    UpdateSelected { packages: Vec<String> },
    UpdateAll,
    CreateBackup,
    RestoreBackup { id: String },
    DeleteBackup { id: String },
}

impl OpRequest {
    #[must_use]
    pub const fn kind(&self) -> OpKind {
        match self {
            Self::Install { .. } => OpKind::Install,
            Self::UpdateSelected { .. } | Self::UpdateAll => OpKind::Update,
            Self::CreateBackup | Self::RestoreBackup { .. } | Self::DeleteBackup { .. } => {
                OpKind::Backup
            }
        }
    }

    /// Package-manager mutations may need sudo; backups never do.
    #[must_use]
    pub const fn needs_privilege(&self) -> bool {
        matches!(self.kind(), OpKind::Install | OpKind::Update)
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            Self::Install { tools } => tools.len(),
            Self::UpdateSelected { packages } => packages.len(),
            Self::UpdateAll
            | Self::CreateBackup
            | Self::RestoreBackup { .. }
            | Self::DeleteBackup { .. } => 1,
        }
    }
}

/// Reserved but not yet running (waiting for launch or for privilege).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOp {
    pub op_id: u64,
    pub request: OpRequest,
    pub awaiting_privilege: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningOp {
    pub op_id: u64,
    pub kind: OpKind,
    pub privileged: bool,
    pub started: Instant,
}

/// The single-flight slot shared by install, update and backup mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSlot {
    pending: Option<PendingOp>,
    running: Option<RunningOp>,
    next_id: u64,
}

impl OperationSlot {
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.pending.is_some() || self.running.is_some()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&PendingOp> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn running(&self) -> Option<&RunningOp> {
        self.running.as_ref()
    }

    #[must_use]
    pub fn is_running(&self, kind: OpKind) -> bool {
        self.running.as_ref().is_some_and(|r| r.kind == kind)
    }

    #[must_use]
    pub fn privileged_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| r.privileged)
    }

    /// Reserve the slot. `None` when another operation holds it.
    pub fn reserve(&mut self, request: OpRequest) -> Option<u64> {
        if self.is_busy() {
            return None;
        }
        self.next_id += 1;
        self.pending = Some(PendingOp {
            op_id: self.next_id,
            request,
            awaiting_privilege: false,
        });
        Some(self.next_id)
    }

    /// Mark the pending operation as waiting on the privilege prompt.
    pub fn await_privilege(&mut self, op_id: u64) -> bool {
        match self.pending.as_mut() {
            Some(p) if p.op_id == op_id => {
                p.awaiting_privilege = true;
                true
            }
            _ => false,
        }
    }

    /// Promote the pending operation to running.
    pub fn mark_started(&mut self, op_id: u64, privileged: bool) -> bool {
        match self.pending.take() {
            Some(p) if p.op_id == op_id => {
                self.running = Some(RunningOp {
                    op_id,
                    kind: p.request.kind(),
                    privileged,
                    started: Instant::now(),
                });
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// Release the slot if it belongs to `op_id`.
    pub fn finish(&mut self, op_id: u64) -> Option<RunningOp> {
        if self.running.as_ref().is_some_and(|r| r.op_id == op_id) {
            return self.running.take();
        }
        if self.pending.as_ref().is_some_and(|p| p.op_id == op_id) {
            self.pending = None;
        }
        None
    }

    /// Drop the pending operation without launching it.
    pub fn abort_pending(&mut self) -> Option<PendingOp> {
        self.pending.take()
    }

    /// Whether streamed output for `op_id` belongs to the current operation.
    #[must_use]
    pub fn owns(&self, op_id: u64) -> bool {
        self.running.as_ref().is_some_and(|r| r.op_id == op_id)
            || self.pending.as_ref().is_some_and(|p| p.op_id == op_id)
    }
}

// ──────────────────── reports ────────────────────

/// Cloneable, thread-safe snapshot of a [`DevkitError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
    pub last_lines: Vec<String>,
    pub fatal: bool,
}

impl From<&DevkitError> for ErrorReport {
    fn from(err: &DevkitError) -> Self {
        let last_lines = match err {
            DevkitError::ProcessExecutionFailed { last_lines, .. } => last_lines.clone(),
            _ => Vec::new(),
        };
        Self {
            code: err.code(),
            message: err.to_string(),
            last_lines,
            fatal: err.is_batch_fatal(),
        }
    }
}

impl From<DevkitError> for ErrorReport {
    fn from(err: DevkitError) -> Self {
        Self::from(&err)
    }
}

impl ErrorReport {
    /// Failure for a task that panicked.
    #[must_use]
    pub fn panicked(task: &str, message: &str) -> Self {
        Self::from(DevkitError::Runtime {
            details: format!("{task} task panicked: {message}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub item: String,
    pub error: ErrorReport,
}

/// Per-item tally of an install or update batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<ItemFailure>,
    pub skipped: Vec<String>,
    /// Set when the whole batch was aborted.
    pub fatal: Option<ErrorReport>,
    pub duration_ms: u64,
}

impl BatchReport {
    #[must_use]
    pub fn fatal(error: ErrorReport) -> Self {
        Self {
            fatal: Some(error),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fatal.is_none() && self.failed.is_empty()
    }

    #[must_use]
    pub fn first_error_code(&self) -> Option<String> {
        self.fatal
            .as_ref()
            .or_else(|| self.failed.first().map(|f| &f.error))
            .map(|e| e.code.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub manager: Option<ManagerKind>,
    pub installed: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Created {
        id: String,
        files: usize,
        skipped: usize,
        failed: Vec<FileFailure>,
        pruned: Vec<String>,
    },
    Restored(RestoreReport),
    Deleted {
        id: String,
    },
}

// ──────────────────── sub-states ────────────────────

/// Tool-id → installed, filled once per session by a background scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallStatusCache {
    pub installed: BTreeMap<String, bool>,
    pub manager: Option<ManagerKind>,
    pub ready: bool,
    pub loading: bool,
    pub error: Option<ErrorReport>,
}

impl InstallStatusCache {
    /// Begin a scan if none has completed or is in flight.
    pub fn begin_scan(&mut self) -> bool {
        if self.ready || self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn apply(&mut self, result: Result<StatusReport, ErrorReport>) {
        self.loading = false;
        match result {
            Ok(report) => {
                self.installed = report.installed;
                self.manager = report.manager;
                self.ready = true;
                self.error = None;
            }
            Err(err) => {
                self.ready = false;
                self.error = Some(err);
            }
        }
    }

    /// Forget the cached map; the next consumer rescans.
    pub fn invalidate(&mut self) {
        self.ready = false;
    }

    #[must_use]
    pub fn is_installed(&self, tool: &str) -> Option<bool> {
        if self.ready {
            self.installed.get(tool).copied()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformState {
    pub info: Option<PlatformInfo>,
    pub checking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemProgress {
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallState {
    pub list: ListState,
    pub selected: BTreeSet<String>,
    pub progress: Option<(ItemProgress, String)>,
    pub last_request: Vec<String>,
    pub report: Option<BatchReport>,
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateState {
    pub list: ListState,
    pub packages: Vec<UpgradablePackage>,
    pub selected: BTreeSet<String>,
    pub loading: bool,
    pub error: Option<ErrorReport>,
    pub progress: Option<(ItemProgress, String)>,
    pub report: Option<BatchReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupsState {
    pub list: ListState,
    pub snapshots: Vec<BackupSnapshot>,
    pub loading: bool,
    /// Snapshot id awaiting a delete or restore confirmation.
    pub confirm: Option<(BackupConfirm, String)>,
    pub last_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupConfirm {
    Restore,
    Delete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilesState {
    pub list: ListState,
    pub fields: ListState,
    pub focus: PaneFocus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureState {
    pub targets: ListState,
    pub fields: ListState,
    pub focus: PaneFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub ttl_ticks: u32,
}

// ──────────────────── root model ────────────────────

/// Root state owned by the dispatch loop.
#[derive(Debug, Clone)]
pub struct AppModel {
    pub config: Config,
    pub palette: ThemePalette,
    pub registry: ToolRegistry,
    pub nav: Navigation,
    pub status: InstallStatusCache,
    pub platform: PlatformState,
    pub ops: OperationSlot,
    pub install: InstallState,
    pub update: UpdateState,
    pub backups: BackupsState,
    pub profiles: ProfilesState,
    pub configure: ConfigureState,
    pub settings: ListState,
    pub menu: ListState,
    pub status_view: ListState,
    pub editor: TextEditor,
    pub log: LogBuffer,
    pub notifications: VecDeque<Notification>,
    pub terminal_size: (u16, u16),
    pub tick: u64,
    pub intro_ticks_left: u32,
    pub quit: bool,
}

impl AppModel {
    #[must_use]
    pub fn new(config: Config, terminal_size: (u16, u16)) -> Self {
        let initial = if config.console.intro {
            Screen::Intro
        } else {
            Screen::Welcome
        };
        Self {
            palette: ThemePalette::from_environment(config.console.theme),
            log: LogBuffer::new(config.console.log_capacity),
            intro_ticks_left: config.console.intro_frames,
            config,
            registry: ToolRegistry::builtin(),
            nav: Navigation::new(initial),
            status: InstallStatusCache::default(),
            platform: PlatformState::default(),
            ops: OperationSlot::default(),
            install: InstallState::default(),
            update: UpdateState::default(),
            backups: BackupsState::default(),
            profiles: ProfilesState::default(),
            configure: ConfigureState::default(),
            settings: ListState::default(),
            menu: ListState::default(),
            status_view: ListState::default(),
            editor: TextEditor::default(),
            notifications: VecDeque::new(),
            terminal_size,
            tick: 0,
            quit: false,
        }
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.nav.current()
    }

    #[must_use]
    pub fn layout(&self) -> DualPaneLayout {
        DualPaneLayout::compute(self.terminal_size.0, self.terminal_size.1)
    }

    /// Queue a footer notification, dropping the oldest beyond the cap.
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push_back(Notification {
            level,
            message: message.into(),
            ttl_ticks: NOTIFICATION_TTL_TICKS,
        });
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    /// Expire notifications by one tick.
    pub fn age_notifications(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);
    }

    /// Tool ids in the registry order shown by list screens.
    #[must_use]
    pub fn tool_ids(&self) -> Vec<&'static str> {
        self.registry.all().iter().map(|t| t.id).collect()
    }

    /// Apply a new theme and re-select the palette.
    pub fn set_theme(&mut self, theme: crate::core::config::ThemeName) {
        self.config.console.theme = theme;
        self.palette = ThemePalette::from_environment(theme);
    }
}

// ──────────────────── messages & commands ────────────────────

/// Everything the dispatch loop reacts to.
#[derive(Debug, Clone)]
pub enum Msg {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    PlatformDetected(PlatformInfo),
    StatusLoaded(Result<StatusReport, ErrorReport>),
    UpdatesChecked(Result<Vec<UpgradablePackage>, ErrorReport>),
    BackupsListed(Vec<BackupSnapshot>),
    /// The operation could not start without an interactive credential prompt.
    PrivilegeRequired { op_id: u64 },
    PrivilegeResolved { granted: bool },
    OperationStarted { op_id: u64, kind: OpKind, privileged: bool },
    LogLine { op_id: u64, line: String },
    ItemStarted { op_id: u64, progress: ItemProgress, item: String },
    InstallFinished { op_id: u64, report: BatchReport },
    UpdateFinished { op_id: u64, report: BatchReport },
    BackupFinished { op_id: u64, result: Result<BackupOutcome, ErrorReport> },
    ConfigSaved(Result<PathBuf, ErrorReport>),
}

/// Side effects requested by `update`, executed by the runtime.
#[derive(Debug, Clone)]
pub enum Cmd {
    None,
    Quit,
    Batch(Vec<Self>),
    DetectPlatform,
    LoadStatus,
    CheckUpdates,
    ListBackups,
    Launch {
        op_id: u64,
        request: OpRequest,
        skip_privilege_check: bool,
    },
    /// Hand the terminal to the credential prompt, then report `PrivilegeResolved`.
    Escalate,
    SaveConfig(Box<Config>),
    Log(ActivityEvent),
}

impl Cmd {
    /// Combine commands, dropping `None`s and flattening a single survivor.
    #[must_use]
    pub fn batch(cmds: impl IntoIterator<Item = Self>) -> Self {
        let mut out: Vec<Self> = cmds
            .into_iter()
            .filter(|c| !matches!(c, Self::None))
            .collect();
        match out.len() {
            0 => Self::None,
            1 => out.pop().unwrap_or(Self::None),
            _ => Self::Batch(out),
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
