#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::unbounded;
use parking_lot::Mutex;

use devkit_console::core::config::Config;
use devkit_console::core::errors::Result;
use devkit_console::logger::activity::ActivityLoggerHandle;
use devkit_console::platform::pkg::{
    ManagerKind, Package, PackageManager, PlatformInfo, StreamingCommand, UpgradablePackage,
};
use devkit_console::platform::privilege::PrivilegeEscalator;
use devkit_console::tui::model::AppModel;
use devkit_console::tui::{Collaborators, Engine, TerminalControl};

// ──────────────────── CLI runner ────────────────────

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_devkit") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "devkit.exe" } else { "devkit" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve devkit binary path for integration test"),
    }
}

/// Run the binary with `args`, keeping a transcript under the temp dir.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("devkit-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("DEVKIT_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1")
        .output()
        .expect("execute devkit command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

// ──────────────────── fake collaborators ────────────────────

/// Scriptable package manager. Every streaming call emits `lines` and succeeds.
pub struct FakePackageManager {
    pub manager: Option<ManagerKind>,
    pub needs_sudo: bool,
    pub lines: Vec<String>,
    pub upgradable: Vec<UpgradablePackage>,
    pub installed: Vec<Package>,
    pub calls: Mutex<Vec<String>>,
}

impl FakePackageManager {
    pub fn new(manager: ManagerKind) -> Self {
        Self {
            manager: Some(manager),
            needs_sudo: false,
            lines: Vec::new(),
            upgradable: Vec::new(),
            installed: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn streaming(&self, call: String) -> Result<StreamingCommand> {
        self.calls.lock().push(call);
        let (tx, rx) = unbounded();
        for line in &self.lines {
            let _ = tx.send(line.clone());
        }
        drop(tx);
        Ok(StreamingCommand::new(rx, || Ok(())))
    }
}

impl PackageManager for FakePackageManager {
    fn detect(&self) -> Option<ManagerKind> {
        self.manager
    }

    fn platform(&self) -> PlatformInfo {
        PlatformInfo {
            os: "linux".to_string(),
            distro: Some("testing".to_string()),
            arch: "x86_64".to_string(),
            manager: self.manager,
        }
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        Ok(self.installed.clone())
    }

    fn install_streaming(&self, packages: &[String]) -> Result<StreamingCommand> {
        self.streaming(format!("install {}", packages.join(" ")))
    }

    fn update_streaming(&self, packages: &[String]) -> Result<StreamingCommand> {
        self.streaming(format!("update {}", packages.join(" ")))
    }

    fn update_all_streaming(&self) -> Result<StreamingCommand> {
        self.streaming("update --all".to_string())
    }

    fn list_upgradable(&self) -> Result<Vec<UpgradablePackage>> {
        Ok(self.upgradable.clone())
    }

    fn needs_sudo(&self) -> bool {
        self.needs_sudo
    }

    fn sudo_cached(&self) -> bool {
        false
    }
}

/// Escalator with a fixed answer that counts prompts.
pub struct FakeEscalator {
    pub grant: bool,
    pub prompts: AtomicUsize,
}

impl FakeEscalator {
    pub fn new(grant: bool) -> Self {
        Self {
            grant,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl PrivilegeEscalator for FakeEscalator {
    fn escalate(&self) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.grant
    }
}

/// Runs foreground prompts inline and counts them.
#[derive(Default)]
pub struct NullTerminal {
    pub foreground_runs: usize,
}

impl TerminalControl for NullTerminal {
    fn run_foreground(&mut self, prompt: &mut dyn FnMut() -> bool) -> Result<bool> {
        self.foreground_runs += 1;
        Ok(prompt())
    }
}

/// Console without the intro, sized `cols`x`rows`, wired to the given fakes.
pub fn engine_with(
    pm: Arc<FakePackageManager>,
    escalator: Arc<FakeEscalator>,
    size: (u16, u16),
) -> Engine {
    let mut cfg = Config::default();
    cfg.console.intro = false;
    cfg.console.mouse = true;
    let deps = Collaborators {
        pm,
        escalator,
        logger: ActivityLoggerHandle::disconnected(),
    };
    Engine::new(AppModel::new(cfg, size), deps)
}

pub fn upgradable(count: usize) -> Vec<UpgradablePackage> {
    (0..count)
        .map(|i| UpgradablePackage {
            name: format!("pkg{i:02}"),
            current: "1.0".to_string(),
            available: "1.1".to_string(),
        })
        .collect()
}
