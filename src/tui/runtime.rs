//! Console runtime: the dispatch loop and its side-effect executor.
//!
//! [`Engine`] owns the model and the message channel. It applies messages
//! through [`update`], executes the resulting [`Cmd`]s (spawning tasks,
//! writing the activity log, handing the terminal to the privilege prompt)
//! and is driven either by [`run`] against a real terminal or directly by
//! tests with fake collaborators.

#![allow(missing_docs)]

use std::io::{self, Stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use crossterm::event::{self, Event};
use parking_lot::Mutex;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::executor::{BackupPlan, OperationContext};
use super::model::{AppModel, Cmd, Msg};
use super::render::render;
use super::tasks::{self, TaskRunner};
use super::terminal_guard::TerminalGuard;
use super::update::update;
use crate::backup::store::BackupStore;
use crate::core::config::Config;
use crate::core::errors::{DevkitError, Result};
use crate::logger::activity::ActivityLoggerHandle;
use crate::platform::pkg::{PackageManager, SystemPackageManager};
use crate::platform::privilege::{PrivilegeEscalator, SudoEscalator};

/// Input poll granularity; bounds how long the input thread holds the gate.
const INPUT_POLL: Duration = Duration::from_millis(50);
/// Messages applied per [`Engine::pump`] call, so a flooding producer cannot
/// starve the draw loop.
pub const MAX_MESSAGES_PER_PUMP: usize = 256;

/// Hands the terminal to a foreground interaction and takes it back.
pub trait TerminalControl {
    /// Run `prompt` with the TUI suspended. Returns the prompt's result.
    ///
    /// # Errors
    /// Returns [`DevkitError::Runtime`] when the TUI cannot be suspended or
    /// restored; the console cannot keep drawing after that.
    fn run_foreground(&mut self, prompt: &mut dyn FnMut() -> bool) -> Result<bool>;
}

/// The two terminal transitions around a foreground prompt.
pub trait Suspendable {
    fn suspend(&mut self) -> io::Result<()>;
    fn resume(&mut self) -> io::Result<()>;
}

impl Suspendable for TerminalGuard {
    fn suspend(&mut self) -> io::Result<()> {
        Self::suspend(self)
    }

    fn resume(&mut self) -> io::Result<()> {
        Self::resume(self)
    }
}

fn terminal_error(stage: &str, source: &io::Error) -> DevkitError {
    DevkitError::Runtime {
        details: format!("terminal {stage} failed: {source}"),
    }
}

/// External collaborators of the engine.
#[derive(Clone)]
pub struct Collaborators {
    pub pm: Arc<dyn PackageManager>,
    pub escalator: Arc<dyn PrivilegeEscalator>,
    pub logger: ActivityLoggerHandle,
}

impl Collaborators {
    /// Host package manager, `sudo -v` escalation.
    #[must_use]
    pub fn system(logger: ActivityLoggerHandle) -> Self {
        Self {
            pm: Arc::new(SystemPackageManager::new()),
            escalator: Arc::new(SudoEscalator),
            logger,
        }
    }
}

pub struct Engine {
    model: AppModel,
    deps: Collaborators,
    runner: TaskRunner,
    tx: Sender<Msg>,
    rx: Receiver<Msg>,
    full_redraw: bool,
    fatal: Option<DevkitError>,
}

impl Engine {
    #[must_use]
    pub fn new(model: AppModel, deps: Collaborators) -> Self {
        let (tx, rx) = unbounded();
        Self {
            model,
            deps,
            runner: TaskRunner::new(tx.clone()),
            tx,
            rx,
            full_redraw: true,
            fatal: None,
        }
    }

    #[must_use]
    pub const fn model(&self) -> &AppModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut AppModel {
        &mut self.model
    }

    /// Sender for input and tick producers.
    #[must_use]
    pub fn sender(&self) -> Sender<Msg> {
        self.tx.clone()
    }

    /// Background tasks that have not reported yet.
    #[must_use]
    pub fn tasks_in_flight(&self) -> usize {
        self.runner.in_flight()
    }

    /// Whether the next frame must be drawn from scratch. Clears the flag.
    pub fn take_full_redraw(&mut self) -> bool {
        std::mem::take(&mut self.full_redraw)
    }

    /// Error that ended the session, if any. Clears it.
    pub fn take_fatal(&mut self) -> Option<DevkitError> {
        self.fatal.take()
    }

    /// Apply one message and execute what it asks for.
    pub fn dispatch(&mut self, msg: Msg, term: &mut dyn TerminalControl) {
        let cmd = update(&mut self.model, msg);
        self.execute(cmd, term);
    }

    pub fn execute(&mut self, cmd: Cmd, term: &mut dyn TerminalControl) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.model.quit = true,
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute(cmd, term);
                }
            }
            Cmd::DetectPlatform => tasks::detect_platform(&self.runner, Arc::clone(&self.deps.pm)),
            Cmd::LoadStatus => {
                tasks::load_status(&self.runner, Arc::clone(&self.deps.pm), self.model.registry);
            }
            Cmd::CheckUpdates => tasks::check_updates(&self.runner, Arc::clone(&self.deps.pm)),
            Cmd::ListBackups => {
                let store = BackupStore::open(self.model.config.paths.backup_dir.clone());
                tasks::list_backups(&self.runner, store);
            }
            Cmd::Launch {
                op_id,
                request,
                skip_privilege_check,
            } => {
                let ctx = OperationContext {
                    pm: Arc::clone(&self.deps.pm),
                    registry: self.model.registry,
                    backups: BackupPlan::from_config(&self.model.config),
                    logger: self.deps.logger.clone(),
                };
                tasks::launch(&self.runner, op_id, request, ctx, skip_privilege_check);
            }
            Cmd::Escalate => {
                let escalator = Arc::clone(&self.deps.escalator);
                match term.run_foreground(&mut || escalator.escalate()) {
                    Ok(granted) => {
                        self.full_redraw = true;
                        let _ = self.tx.send(Msg::PrivilegeResolved { granted });
                    }
                    Err(err) => {
                        // Release the pending operation, then stop: nothing can be drawn.
                        let _ = self.tx.send(Msg::PrivilegeResolved { granted: false });
                        self.model.quit = true;
                        self.fatal = Some(err);
                    }
                }
            }
            Cmd::SaveConfig(config) => tasks::save_config(&self.runner, *config),
            Cmd::Log(event) => self.deps.logger.send(event),
        }
    }

    /// Wait up to `timeout` for a message, then drain what is queued, up to
    /// [`MAX_MESSAGES_PER_PUMP`]. Returns the number of messages applied.
    pub fn pump(&mut self, timeout: Duration, term: &mut dyn TerminalControl) -> usize {
        let first = match self.rx.recv_timeout(timeout) {
            Ok(msg) => msg,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return 0,
        };
        self.dispatch(first, term);
        let mut applied = 1;
        while applied < MAX_MESSAGES_PER_PUMP {
            let Ok(msg) = self.rx.try_recv() else {
                break;
            };
            self.dispatch(msg, term);
            applied += 1;
        }
        applied
    }

    /// Pump until no task is in flight and the queue is empty, or `limit` passes.
    /// Returns `true` when settled.
    pub fn settle(&mut self, limit: Duration, term: &mut dyn TerminalControl) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            if self.runner.in_flight() == 0 && self.rx.is_empty() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pump((deadline - now).min(Duration::from_millis(20)), term);
        }
    }
}

// ──────────────────── real terminal ────────────────────

/// Suspends the TUI around a foreground prompt while holding the gate that
/// keeps the input thread off stdin.
struct TerminalHandoff<G> {
    guard: G,
    input_gate: Arc<Mutex<()>>,
}

impl<G: Suspendable> TerminalControl for TerminalHandoff<G> {
    fn run_foreground(&mut self, prompt: &mut dyn FnMut() -> bool) -> Result<bool> {
        let _gate = self.input_gate.lock();
        if let Err(source) = self.guard.suspend() {
            // Half-suspended; take the screen back before reporting.
            let _ = self.guard.resume();
            return Err(terminal_error("suspend", &source));
        }
        let granted = prompt();
        self.guard
            .resume()
            .map_err(|source| terminal_error("resume", &source))?;
        Ok(granted)
    }
}

fn spawn_input_thread(tx: Sender<Msg>, gate: Arc<Mutex<()>>, stop: Arc<AtomicBool>) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("devkit-input".to_string())
        .spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let event = {
                    let _gate = gate.lock();
                    match event::poll(INPUT_POLL) {
                        Ok(true) => event::read().ok(),
                        Ok(false) => None,
                        Err(_) => break,
                    }
                };
                let msg = match event {
                    Some(Event::Key(key)) => Msg::Key(key),
                    Some(Event::Mouse(mouse)) => Msg::Mouse(mouse),
                    Some(Event::Resize(cols, rows)) => Msg::Resize(cols, rows),
                    _ => continue,
                };
                if tx.send(msg).is_err() {
                    break;
                }
            }
        })
        .map_err(|source| DevkitError::Runtime {
            details: format!("failed to spawn input thread: {source}"),
        })
}

fn spawn_ticker(tx: Sender<Msg>, every: Duration, stop: Arc<AtomicBool>) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("devkit-tick".to_string())
        .spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                thread::sleep(every);
                if tx.send(Msg::Tick).is_err() {
                    break;
                }
            }
        })
        .map_err(|source| DevkitError::Runtime {
            details: format!("failed to spawn tick thread: {source}"),
        })
}

fn draw(engine: &mut Engine, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    if engine.take_full_redraw() {
        terminal.clear()?;
    }
    terminal.draw(|frame| render(engine.model(), frame))?;
    Ok(())
}

/// Run the console on the controlling terminal until the user quits.
///
/// # Errors
/// Returns [`DevkitError::Runtime`] when the terminal cannot be set up,
/// written or restored after a foreground prompt, or a worker thread cannot
/// be spawned.
pub fn run(config: Config, deps: Collaborators) -> Result<()> {
    let terminal_err = |source: io::Error| DevkitError::Runtime {
        details: format!("terminal: {source}"),
    };
    let tick = Duration::from_millis(config.console.tick_ms.max(16));
    let guard = TerminalGuard::new(config.console.mouse).map_err(terminal_err)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout())).map_err(terminal_err)?;
    let mut handoff = TerminalHandoff {
        guard,
        input_gate: Arc::new(Mutex::new(())),
    };

    let model = AppModel::new(config, TerminalGuard::terminal_size());
    let mut engine = Engine::new(model, deps);
    let stop = Arc::new(AtomicBool::new(false));
    let input = spawn_input_thread(engine.sender(), Arc::clone(&handoff.input_gate), Arc::clone(&stop))?;
    let ticker = spawn_ticker(engine.sender(), tick, Arc::clone(&stop))?;

    let mut outcome = Ok(());
    while !engine.model().quit {
        if let Err(source) = draw(&mut engine, &mut terminal) {
            outcome = Err(terminal_err(source));
            break;
        }
        engine.pump(tick, &mut handoff);
    }
    if let Some(fatal) = engine.take_fatal() {
        outcome = Err(fatal);
    }

    stop.store(true, Ordering::Relaxed);
    let _ = input.join();
    let _ = ticker.join();
    drop(terminal);
    // Dropping the guard leaves raw mode and the alternate screen.
    drop(handoff);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::model::Screen;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    struct NoTerminal;

    impl TerminalControl for NoTerminal {
        fn run_foreground(&mut self, prompt: &mut dyn FnMut() -> bool) -> Result<bool> {
            Ok(prompt())
        }
    }

    /// Suspends fine; resuming fails while `resume_fails` is set.
    #[derive(Default)]
    struct FlakyGuard {
        resume_fails: bool,
        suspended: usize,
        resumed: usize,
    }

    impl Suspendable for FlakyGuard {
        fn suspend(&mut self) -> io::Result<()> {
            self.suspended += 1;
            Ok(())
        }

        fn resume(&mut self) -> io::Result<()> {
            self.resumed += 1;
            if self.resume_fails {
                Err(io::Error::other("tty gone"))
            } else {
                Ok(())
            }
        }
    }

    fn handoff(resume_fails: bool) -> TerminalHandoff<FlakyGuard> {
        TerminalHandoff {
            guard: FlakyGuard {
                resume_fails,
                ..FlakyGuard::default()
            },
            input_gate: Arc::new(Mutex::new(())),
        }
    }

    struct Deny;

    impl PrivilegeEscalator for Deny {
        fn escalate(&self) -> bool {
            false
        }
    }

    fn engine() -> Engine {
        let mut cfg = Config::default();
        cfg.console.intro = false;
        let deps = Collaborators {
            pm: Arc::new(SystemPackageManager::with_manager(crate::platform::pkg::ManagerKind::Brew)),
            escalator: Arc::new(Deny),
            logger: ActivityLoggerHandle::disconnected(),
        };
        Engine::new(AppModel::new(cfg, (100, 30)), deps)
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut engine = engine();
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        engine.sender().send(Msg::Key(q)).unwrap();
        assert_eq!(engine.pump(Duration::from_millis(100), &mut NoTerminal), 1);
        assert!(engine.model().quit);
    }

    #[test]
    fn pump_times_out_without_messages() {
        let mut engine = engine();
        assert_eq!(engine.pump(Duration::from_millis(10), &mut NoTerminal), 0);
        assert_eq!(engine.model().screen(), Screen::Welcome);
    }

    #[test]
    fn escalation_reports_back_and_forces_redraw() {
        let mut engine = engine();
        assert!(engine.take_full_redraw());
        engine.execute(Cmd::Escalate, &mut NoTerminal);
        assert!(engine.take_full_redraw());
        // No pending operation: the resolution is ignored.
        assert_eq!(engine.pump(Duration::from_millis(100), &mut NoTerminal), 1);
        assert!(!engine.model().ops.is_busy());
    }

    #[test]
    fn handoff_returns_the_prompt_answer() {
        let mut term = handoff(false);
        assert!(term.run_foreground(&mut || true).unwrap());
        assert_eq!(term.guard.suspended, 1);
        assert_eq!(term.guard.resumed, 1);
    }

    #[test]
    fn failed_resume_is_an_error() {
        let mut term = handoff(true);
        let err = term.run_foreground(&mut || true).unwrap_err();
        assert!(err.to_string().contains("resume"), "{err}");
        assert!(term.input_gate.try_lock().is_some(), "gate released after failure");
    }

    #[test]
    fn failed_resume_stops_the_console() {
        let mut engine = engine();
        engine.take_full_redraw();
        let mut term = handoff(true);
        engine.execute(Cmd::Escalate, &mut term);

        assert!(engine.model().quit);
        assert!(!engine.take_full_redraw());
        let fatal = engine.take_fatal().expect("fatal error recorded");
        assert!(matches!(fatal, DevkitError::Runtime { .. }));
        assert!(engine.take_fatal().is_none());
        // The refusal still reaches the model so no operation stays pending.
        assert_eq!(engine.pump(Duration::from_millis(100), &mut NoTerminal), 1);
        assert!(!engine.model().ops.is_busy());
    }

    #[test]
    fn pump_applies_a_bounded_batch() {
        let mut engine = engine();
        let tx = engine.sender();
        for _ in 0..1000 {
            tx.send(Msg::Tick).unwrap();
        }
        assert_eq!(engine.pump(Duration::from_millis(100), &mut NoTerminal), MAX_MESSAGES_PER_PUMP);
        assert_eq!(engine.rx.len(), 1000 - MAX_MESSAGES_PER_PUMP);
        assert_eq!(engine.model().tick, u64::try_from(MAX_MESSAGES_PER_PUMP).unwrap());
    }
}
