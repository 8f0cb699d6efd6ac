//! Foreground privilege escalation.
//!
//! The escalator runs with the terminal handed back to the user: the runtime
//! suspends the TUI before calling [`PrivilegeEscalator::escalate`] and resumes
//! it afterwards.

use std::process::{Command, Stdio};

/// Obtains elevated execution rights through an interactive prompt.
pub trait PrivilegeEscalator: Send + Sync {
    /// Prompt the user; `true` when credentials were granted.
    fn escalate(&self) -> bool;
}

/// `sudo -v` with inherited stdio so the password prompt reaches the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct SudoEscalator;

impl PrivilegeEscalator for SudoEscalator {
    fn escalate(&self) -> bool {
        Command::new("sudo")
            .arg("-v")
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .is_ok_and(|status| status.success())
    }
}
