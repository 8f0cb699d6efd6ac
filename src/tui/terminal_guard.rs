//! RAII terminal lifecycle guard backed by crossterm.
//!
//! [`TerminalGuard`] enters raw mode, the alternate screen and (optionally)
//! mouse capture on construction, and restores the terminal on [`Drop`], even
//! during panics or early error returns. A panic hook restores the terminal
//! *before* the panic message is printed so the message lands on a normal
//! screen.
//!
//! [`TerminalGuard::suspend`] and [`TerminalGuard::resume`] hand the terminal
//! to a foreground child process (the sudo password prompt) and take it back.

use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};

/// Set while raw mode is on. Checked by the panic hook.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);
/// Set while mouse reporting is on, so restoration can turn it off.
static MOUSE_ACTIVE: AtomicBool = AtomicBool::new(false);

pub struct TerminalGuard {
    mouse: bool,
    hook_installed: bool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen, installing a panic-safe cleanup hook.
    ///
    /// # Errors
    /// Returns I/O errors if terminal setup fails. On partial failure whatever
    /// was set up is undone before returning.
    pub fn new(mouse: bool) -> io::Result<Self> {
        enter(mouse).inspect_err(|_| restore_terminal_best_effort())?;

        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal_best_effort();
            prev(info);
        }));

        Ok(Self {
            mouse,
            hook_installed: true,
        })
    }

    /// Give the terminal back to the user for a foreground prompt.
    ///
    /// # Errors
    /// Returns I/O errors from crossterm.
    pub fn suspend(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        if MOUSE_ACTIVE.swap(false, Ordering::SeqCst) {
            execute!(stdout, DisableMouseCapture)?;
        }
        execute!(stdout, LeaveAlternateScreen, Show)?;
        RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
        terminal::disable_raw_mode()?;
        stdout.flush()
    }

    /// Re-enter the TUI after [`Self::suspend`].
    ///
    /// # Errors
    /// Returns I/O errors from crossterm.
    pub fn resume(&mut self) -> io::Result<()> {
        enter(self.mouse)
    }

    /// Terminal dimensions (columns, rows).
    ///
    /// Asks the tty first, then `$COLUMNS`/`$LINES`, then falls back to 80x24.
    #[must_use]
    pub fn terminal_size() -> (u16, u16) {
        if let Ok((cols, rows)) = terminal::size()
            && cols > 0
            && rows > 0
        {
            return (cols, rows);
        }
        let from_env = |name: &str, fallback: u16| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(fallback)
        };
        (from_env("COLUMNS", 80), from_env("LINES", 24))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal_best_effort();
        if self.hook_installed {
            // The previous hook moved into our closure; fall back to the default.
            let _ = panic::take_hook();
        }
    }
}

fn enter(mouse: bool) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    if mouse {
        execute!(stdout, EnableMouseCapture)?;
        MOUSE_ACTIVE.store(true, Ordering::SeqCst);
    }
    Ok(())
}

/// Best-effort terminal restoration. Safe to call repeatedly.
fn restore_terminal_best_effort() {
    let mut stdout = io::stdout();
    if MOUSE_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = execute!(stdout, DisableMouseCapture);
    }
    if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = execute!(stdout, LeaveAlternateScreen, Show);
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

// ──────────────────── tests ────────────────────
