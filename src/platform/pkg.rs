//! Package-manager abstraction: detection, batch listing and streaming installs.
//!
//! Every long-running command is started through [`spawn_streaming`], which
//! hands back a [`StreamingCommand`]: a channel of output lines fed by reader
//! threads and a one-shot waiter that reaps the child.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::env;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{DevkitError, FAILURE_CONTEXT_LINES, Result};

// ──────────────────── types ────────────────────

/// Supported system package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerKind {
    Apt,
    Dnf,
    Pacman,
    Brew,
}

impl ManagerKind {
    /// Order tried by detection.
    pub const DETECTION_ORDER: [Self; 4] = [Self::Brew, Self::Apt, Self::Dnf, Self::Pacman];

    #[must_use]
    pub const fn binary(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Brew => "brew",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Brew => "brew",
        }
    }

    /// Whether package mutations go through sudo for non-root users.
    #[must_use]
    pub const fn mutates_as_root(self) -> bool {
        !matches!(self, Self::Brew)
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host description shown on the platform-check screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub os: String,
    pub distro: Option<String>,
    pub arch: String,
    pub manager: Option<ManagerKind>,
}

/// An installed package as reported by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    pub version: String,
}

/// A package with a newer version available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradablePackage {
    pub name: String,
    pub current: String,
    pub available: String,
}

type Waiter = Box<dyn FnOnce() -> Result<()> + Send>;

/// A running external command: output lines plus a one-shot completion waiter.
pub struct StreamingCommand {
    /// Output lines (stdout and stderr interleaved in read order).
    pub lines: Receiver<String>,
    waiter: Waiter,
}

impl StreamingCommand {
    pub fn new(lines: Receiver<String>, waiter: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self {
            lines,
            waiter: Box::new(waiter),
        }
    }

    /// Block until the process exits. Call after draining `lines`.
    pub fn wait(self) -> Result<()> {
        (self.waiter)()
    }
}

impl fmt::Debug for StreamingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingCommand").finish_non_exhaustive()
    }
}

/// Package-manager collaborator consumed by the console.
pub trait PackageManager: Send + Sync {
    fn detect(&self) -> Option<ManagerKind>;
    fn platform(&self) -> PlatformInfo;
    fn list_installed(&self) -> Result<Vec<Package>>;
    fn install_streaming(&self, packages: &[String]) -> Result<StreamingCommand>;
    fn update_streaming(&self, packages: &[String]) -> Result<StreamingCommand>;
    fn update_all_streaming(&self) -> Result<StreamingCommand>;
    fn list_upgradable(&self) -> Result<Vec<UpgradablePackage>>;
    /// Whether mutations require elevated privileges.
    fn needs_sudo(&self) -> bool;
    /// Whether sudo credentials are currently cached (no prompt needed).
    fn sudo_cached(&self) -> bool;
}

// ──────────────────── system implementation ────────────────────

/// Package manager backed by the host's real tooling.
#[derive(Debug, Default)]
pub struct SystemPackageManager {
    detected: RwLock<Option<Option<ManagerKind>>>,
}

impl SystemPackageManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed manager instead of searching `$PATH`.
    #[must_use]
    pub fn with_manager(kind: ManagerKind) -> Self {
        Self {
            detected: RwLock::new(Some(Some(kind))),
        }
    }

    fn require(&self) -> Result<ManagerKind> {
        self.detect().ok_or(DevkitError::NoPackageManagerDetected)
    }

    fn mutate(&self, kind: ManagerKind, args: &[String]) -> Result<StreamingCommand> {
        if kind.mutates_as_root() && !running_as_root() {
            // -n: never prompt inside the UI; credentials are refreshed beforehand.
            let mut full = vec!["-n".to_string(), kind.binary().to_string()];
            full.extend_from_slice(args);
            spawn_streaming("sudo", &full)
        } else {
            spawn_streaming(kind.binary(), args)
        }
    }
}

impl PackageManager for SystemPackageManager {
    fn detect(&self) -> Option<ManagerKind> {
        if let Some(cached) = *self.detected.read() {
            return cached;
        }
        let found = ManagerKind::DETECTION_ORDER
            .into_iter()
            .find(|kind| find_in_path(kind.binary()).is_some());
        *self.detected.write() = Some(found);
        found
    }

    fn platform(&self) -> PlatformInfo {
        PlatformInfo {
            os: env::consts::OS.to_string(),
            distro: fs::read_to_string("/etc/os-release")
                .ok()
                .and_then(|raw| parse_os_release(&raw)),
            arch: env::consts::ARCH.to_string(),
            manager: self.detect(),
        }
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        let kind = self.require()?;
        let (program, args): (&str, &[&str]) = match kind {
            ManagerKind::Apt => ("dpkg-query", &["-W", "-f=${Package}\t${Version}\n"]),
            ManagerKind::Dnf => ("rpm", &["-qa", "--qf", "%{NAME}\t%{VERSION}\n"]),
            ManagerKind::Pacman => ("pacman", &["-Q"]),
            ManagerKind::Brew => ("brew", &["list", "--versions"]),
        };
        let raw = capture(program, args, &[0])?;
        Ok(parse_installed(&raw))
    }

    fn install_streaming(&self, packages: &[String]) -> Result<StreamingCommand> {
        let kind = self.require()?;
        let mut args: Vec<String> = match kind {
            ManagerKind::Apt => vec!["install".into(), "-y".into()],
            ManagerKind::Dnf => vec!["install".into(), "-y".into()],
            ManagerKind::Pacman => vec!["-S".into(), "--noconfirm".into(), "--needed".into()],
            ManagerKind::Brew => vec!["install".into()],
        };
        args.extend_from_slice(packages);
        self.mutate(kind, &args)
    }

    fn update_streaming(&self, packages: &[String]) -> Result<StreamingCommand> {
        let kind = self.require()?;
        let mut args: Vec<String> = match kind {
            ManagerKind::Apt => vec!["install".into(), "--only-upgrade".into(), "-y".into()],
            ManagerKind::Dnf => vec!["upgrade".into(), "-y".into()],
            ManagerKind::Pacman => vec!["-S".into(), "--noconfirm".into()],
            ManagerKind::Brew => vec!["upgrade".into()],
        };
        args.extend_from_slice(packages);
        self.mutate(kind, &args)
    }

    fn update_all_streaming(&self) -> Result<StreamingCommand> {
        let kind = self.require()?;
        let args: Vec<String> = match kind {
            ManagerKind::Apt => vec!["upgrade".into(), "-y".into()],
            ManagerKind::Dnf => vec!["upgrade".into(), "-y".into()],
            ManagerKind::Pacman => vec!["-Syu".into(), "--noconfirm".into()],
            ManagerKind::Brew => vec!["upgrade".into()],
        };
        self.mutate(kind, &args)
    }

    fn list_upgradable(&self) -> Result<Vec<UpgradablePackage>> {
        let kind = self.require()?;
        let parsed = match kind {
            ManagerKind::Apt => parse_apt_upgradable(&capture("apt", &["list", "--upgradable"], &[0])?),
            // dnf exits 100 when updates are available.
            ManagerKind::Dnf => parse_dnf_upgradable(&capture("dnf", &["check-update", "-q"], &[0, 100])?),
            // pacman -Qu exits 1 when nothing is upgradable.
            ManagerKind::Pacman => parse_arrow_upgradable(&capture("pacman", &["-Qu"], &[0, 1])?),
            ManagerKind::Brew => parse_brew_upgradable(&capture("brew", &["outdated", "--verbose"], &[0])?),
        };
        Ok(parsed)
    }

    fn needs_sudo(&self) -> bool {
        self.detect()
            .is_some_and(|kind| kind.mutates_as_root() && !running_as_root())
    }

    fn sudo_cached(&self) -> bool {
        Command::new("sudo")
            .args(["-n", "true"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }
}

// ──────────────────── process plumbing ────────────────────

/// Spawn `program args...` with piped output and stream its lines.
///
/// The waiter fails with [`DevkitError::ProcessExecutionFailed`] carrying the
/// last output lines when the process exits unsuccessfully.
pub fn spawn_streaming(program: &str, args: &[String]) -> Result<StreamingCommand> {
    let command_line = render_command(program, args);
    let mut child = Command::new(program)
        .args(args)
        .env("DEBIAN_FRONTEND", "noninteractive")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DevkitError::ProcessExecutionFailed {
            command: command_line.clone(),
            status: format!("spawn failed: {e}"),
            last_lines: Vec::new(),
        })?;

    let (tx, rx) = unbounded::<String>();
    let tail = Arc::new(Mutex::new(VecDeque::with_capacity(FAILURE_CONTEXT_LINES)));

    let mut readers = Vec::with_capacity(2);
    let pipes = [
        child.stdout.take().map(|p| ("devkit-stdout", Box::new(p) as Box<dyn Read + Send>)),
        child.stderr.take().map(|p| ("devkit-stderr", Box::new(p) as Box<dyn Read + Send>)),
    ];
    for (name, pipe) in pipes.into_iter().flatten() {
        match spawn_reader(name, pipe, tx.clone(), Arc::clone(&tail)) {
            Ok(handle) => readers.push(handle),
            Err(err) => {
                // No reader means a pipe nobody drains; do not leave the child running.
                abandon(&mut child);
                return Err(err);
            }
        }
    }
    drop(tx);

    Ok(StreamingCommand::new(rx, move || {
        let status = child
            .wait()
            .map_err(|e| DevkitError::ProcessExecutionFailed {
                command: command_line.clone(),
                status: format!("wait failed: {e}"),
                last_lines: Vec::new(),
            })?;
        for reader in readers {
            let _ = reader.join();
        }
        if status.success() {
            Ok(())
        } else {
            let lines: Vec<String> = tail.lock().iter().cloned().collect();
            Err(DevkitError::process_failed(command_line, status.to_string(), &lines))
        }
    }))
}

fn spawn_reader<R: Read + Send + 'static>(
    name: &str,
    source: R,
    tx: Sender<String>,
    tail: Arc<Mutex<VecDeque<String>>>,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let mut reader = BufReader::new(source);
            let mut buf = Vec::with_capacity(256);
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
                let line = decode_line(&buf);
                {
                    let mut tail = tail.lock();
                    if tail.len() == FAILURE_CONTEXT_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line.clone());
                }
                // Receiver gone means nobody is watching; keep draining the pipe.
                let _ = tx.send(line);
            }
        })
        .map_err(|e| DevkitError::Runtime {
            details: format!("failed to spawn output reader: {e}"),
        })
}

/// One raw output line as display text. Invalid UTF-8 is replaced, not fatal.
/// Kill `child` and reap it so no zombie outlives a failed start.
fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn decode_line(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    strip_ansi(text.trim_end_matches(['\n', '\r']))
}

/// Run a short command to completion and capture stdout.
fn capture(program: &str, args: &[&str], ok_codes: &[i32]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| DevkitError::ProcessExecutionFailed {
            command: program.to_string(),
            status: format!("spawn failed: {e}"),
            last_lines: Vec::new(),
        })?;
    let code = output.status.code().unwrap_or(-1);
    if !ok_codes.contains(&code) {
        let stderr: Vec<String> = String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string)
            .collect();
        let owned: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        return Err(DevkitError::process_failed(
            render_command(program, &owned),
            output.status.to_string(),
            &stderr,
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn render_command(program: &str, args: &[String]) -> String {
    let mut out = program.to_string();
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

/// Locate an executable on `$PATH`.
#[must_use]
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

// ──────────────────── parsing ────────────────────

fn ansi_regex() -> Option<&'static Regex> {
    static ANSI: OnceLock<Option<Regex>> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07|\x1b[()][0-9A-B]").ok())
        .as_ref()
}

/// Remove terminal escape sequences from a line of subprocess output.
#[must_use]
pub fn strip_ansi(line: &str) -> String {
    match ansi_regex() {
        Some(re) => re.replace_all(line, "").into_owned(),
        None => line.to_string(),
    }
}

fn parse_os_release(raw: &str) -> Option<String> {
    raw.lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Parse `name<ws>version` listings (dpkg-query, rpm, pacman -Q, brew list --versions).
fn parse_installed(raw: &str) -> Vec<Package> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next().unwrap_or_default();
            Some(Package {
                name: name.to_string(),
                version: version.to_string(),
            })
        })
        .collect()
}

/// `git/jammy-updates 1:2.34.1-1ubuntu1.11 amd64 [upgradable from: 1:2.34.1-1ubuntu1.10]`
fn parse_apt_upgradable(raw: &str) -> Vec<UpgradablePackage> {
    raw.lines()
        .filter(|line| line.contains("[upgradable from:"))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?.split('/').next()?;
            let available = fields.next()?;
            let current = line
                .rsplit_once("upgradable from: ")?
                .1
                .trim_end_matches(']');
            Some(UpgradablePackage {
                name: name.to_string(),
                current: current.to_string(),
                available: available.to_string(),
            })
        })
        .collect()
}

/// `git.x86_64   2.43.0-1.fc39   updates`
fn parse_dnf_upgradable(raw: &str) -> Vec<UpgradablePackage> {
    raw.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return None;
            }
            let name = fields[0].rsplit_once('.').map_or(fields[0], |(n, _)| n);
            Some(UpgradablePackage {
                name: name.to_string(),
                current: String::new(),
                available: fields[1].to_string(),
            })
        })
        .collect()
}

/// `git 2.42.0-1 -> 2.43.0-1`
fn parse_arrow_upgradable(raw: &str) -> Vec<UpgradablePackage> {
    raw.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [name, current, "->", available, ..] => Some(UpgradablePackage {
                    name: (*name).to_string(),
                    current: (*current).to_string(),
                    available: (*available).to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// `neovim (0.9.4) < 0.9.5`
fn parse_brew_upgradable(raw: &str) -> Vec<UpgradablePackage> {
    raw.lines()
        .filter_map(|line| {
            let (left, available) = line.split_once(" < ")?;
            let (name, current) = left.split_once(' ')?;
            Some(UpgradablePackage {
                name: name.to_string(),
                current: current.trim_matches(|c| c == '(' || c == ')').to_string(),
                available: available.trim().to_string(),
            })
        })
        .collect()
}

// ──────────────────── tests ────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn run_script(script: &str) -> (Vec<String>, Result<()>) {
        let args = vec!["-c".to_string(), script.to_string()];
        let command = spawn_streaming("sh", &args).unwrap();
        let lines: Vec<String> = command.lines.iter().collect();
        (lines, command.wait())
    }

    #[cfg(unix)]
    #[test]
    fn invalid_utf8_line_does_not_end_the_stream() {
        let (lines, status) = run_script(r"printf 'before\n\377oops\nafter\n'");
        assert!(status.is_ok());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "before");
        assert!(lines[1].ends_with("oops"));
        assert!(lines[1].contains('\u{FFFD}'));
        assert_eq!(lines[2], "after");
    }

    #[cfg(unix)]
    #[test]
    fn output_after_invalid_bytes_is_fully_drained() {
        // Far more than a pipe buffer: a reader that stopped early would
        // leave the writer blocked or killed by SIGPIPE.
        let (lines, status) = run_script(
            r"printf '\377\n'; i=0; while [ $i -lt 4000 ]; do echo line-$i-padding-padding-padding-padding-padding; i=$((i+1)); done",
        );
        assert!(status.is_ok());
        assert_eq!(lines.len(), 4001);
        assert!(lines[4000].starts_with("line-3999"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_keeps_its_last_lines() {
        let (lines, status) = run_script("echo one; echo two >&2; exit 3");
        assert_eq!(lines.len(), 2);
        let err = status.unwrap_err();
        assert_eq!(err.code(), "DVK-2003");
        let DevkitError::ProcessExecutionFailed { last_lines, .. } = err else {
            panic!("expected a process failure");
        };
        assert!(last_lines.contains(&"two".to_string()));
    }

    #[test]
    fn decode_line_replaces_invalid_bytes_and_strips_endings() {
        assert_eq!(decode_line(b"ok\r\n"), "ok");
        assert_eq!(decode_line(b"\x1b[32mgreen\x1b[0m\n"), "green");
        assert_eq!(decode_line(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn strip_ansi_removes_color_and_cursor_sequences() {
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[0m done"), "ok done");
        assert_eq!(strip_ansi("\x1b[?25lprogress\x1b[2K"), "progress");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn parses_installed_listing() {
        let pkgs = parse_installed("git\t1:2.34.1\nripgrep 13.0.0\n\nneovim 0.9.5 0.9.4\n");
        assert_eq!(pkgs.len(), 3);
        assert_eq!(pkgs[0].name, "git");
        assert_eq!(pkgs[2].version, "0.9.5");
    }

    #[test]
    fn parses_apt_upgradable() {
        let raw = "Listing... Done\n\
                   git/jammy-updates 1:2.34.1-1ubuntu1.11 amd64 [upgradable from: 1:2.34.1-1ubuntu1.10]\n";
        let ups = parse_apt_upgradable(raw);
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].name, "git");
        assert_eq!(ups[0].available, "1:2.34.1-1ubuntu1.11");
        assert_eq!(ups[0].current, "1:2.34.1-1ubuntu1.10");
    }

    #[test]
    fn parses_dnf_pacman_and_brew_upgradable() {
        let dnf = parse_dnf_upgradable("\ngit.x86_64   2.43.0-1.fc39   updates\n");
        assert_eq!(dnf[0].name, "git");
        assert_eq!(dnf[0].available, "2.43.0-1.fc39");

        let pacman = parse_arrow_upgradable("git 2.42.0-1 -> 2.43.0-1\nbroken line\n");
        assert_eq!(pacman.len(), 1);
        assert_eq!(pacman[0].current, "2.42.0-1");

        let brew = parse_brew_upgradable("neovim (0.9.4) < 0.9.5\n");
        assert_eq!(brew[0].current, "0.9.4");
        assert_eq!(brew[0].available, "0.9.5");
    }

    #[test]
    fn os_release_pretty_name() {
        let raw = "NAME=\"Ubuntu\"\nPRETTY_NAME=\"Ubuntu 22.04.4 LTS\"\n";
        assert_eq!(parse_os_release(raw).as_deref(), Some("Ubuntu 22.04.4 LTS"));
        assert_eq!(parse_os_release("NAME=x\n"), None);
    }

    #[test]
    fn fixed_manager_skips_path_search() {
        let pm = SystemPackageManager::with_manager(ManagerKind::Brew);
        assert_eq!(pm.detect(), Some(ManagerKind::Brew));
        assert!(!pm.needs_sudo());
    }

    #[cfg(unix)]
    #[test]
    fn streaming_command_forwards_lines_and_reports_status() {
        let cmd = spawn_streaming(
            "sh",
            &["-c".to_string(), "echo one; echo two 1>&2; echo three".to_string()],
        )
        .unwrap();
        let lines: Vec<String> = cmd.lines.iter().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&"two".to_string()));
        cmd.wait().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn streaming_failure_carries_output_tail() {
        let cmd = spawn_streaming("sh", &["-c".to_string(), "echo boom; exit 3".to_string()]).unwrap();
        let _: Vec<String> = cmd.lines.iter().collect();
        match cmd.wait() {
            Err(DevkitError::ProcessExecutionFailed { last_lines, .. }) => {
                assert_eq!(last_lines, vec!["boom".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn abandoned_child_is_killed_and_reaped() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        abandon(&mut child);
        let status = child.try_wait().unwrap().expect("child already reaped");
        assert!(!status.success());
    }
}
