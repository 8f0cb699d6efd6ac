//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use devkit_console::backup::store::BackupStore;
use devkit_console::core::config::{Config, ThemeName};
use devkit_console::core::errors::DevkitError;
use devkit_console::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};
use devkit_console::platform::pkg::SystemPackageManager;
use devkit_console::tools::registry::ToolRegistry;
use devkit_console::tui::tasks::scan_status;
use devkit_console::tui::{self, Collaborators};

/// devkit: install, update, configure and back up a developer toolset.
#[derive(Debug, Parser)]
#[command(
    name = "devkit",
    author,
    version,
    about = "Developer environment console",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute (defaults to the interactive console).
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Open the interactive console.
    Console(ConsoleArgs),
    /// Show which registered tools are installed.
    Status,
    /// Manage dotfile backup snapshots.
    Backups(BackupsArgs),
    /// Inspect configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct ConsoleArgs {
    /// Skip the intro animation.
    #[arg(long)]
    no_intro: bool,
    /// Color theme (default, high-contrast, mono).
    #[arg(long, value_name = "NAME", value_parser = parse_theme)]
    theme: Option<ThemeName>,
    /// Disable mouse capture.
    #[arg(long)]
    no_mouse: bool,
}

#[derive(Debug, Clone, Args)]
struct BackupsArgs {
    #[command(subcommand)]
    command: BackupCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum BackupCommand {
    /// List snapshots, newest first.
    List,
    /// Snapshot the tracked dotfiles now.
    Create,
    /// Copy a snapshot's files back into place.
    Restore {
        /// Snapshot id.
        id: String,
    },
    /// Delete a snapshot.
    Delete {
        /// Snapshot id.
        id: String,
    },
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Operation partially succeeded.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

impl From<DevkitError> for CliError {
    fn from(err: DevkitError) -> Self {
        match err {
            DevkitError::InvalidConfig { .. }
            | DevkitError::MissingConfig { .. }
            | DevkitError::ConfigParse { .. }
            | DevkitError::UnknownTool { .. }
            | DevkitError::BackupNotFound { .. }
            | DevkitError::NoPackageManagerDetected => Self::User(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        None => run_console(cli, &ConsoleArgs::default()),
        Some(Command::Console(args)) => run_console(cli, args),
        Some(Command::Status) => run_status(cli),
        Some(Command::Backups(args)) => run_backups(cli, args),
        Some(Command::Config(args)) => run_config(cli, args),
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn parse_theme(raw: &str) -> Result<ThemeName, String> {
    ThemeName::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = ThemeName::ALL.iter().map(|t| t.label()).collect();
        format!("unknown theme `{raw}` (expected one of: {})", known.join(", "))
    })
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Ok(Config::load(cli.config.as_deref())?)
}

// ──────────────────── console ────────────────────

fn run_console(cli: &Cli, args: &ConsoleArgs) -> Result<(), CliError> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(CliError::User(
            "the console needs an interactive terminal; try `devkit status`".to_string(),
        ));
    }

    let (mut config, fallback) = Config::load_or_default(cli.config.as_deref());
    if args.no_intro {
        config.console.intro = false;
    }
    if let Some(theme) = args.theme {
        config.console.theme = theme;
    }
    if args.no_mouse {
        config.console.mouse = false;
    }

    let (logger, logger_join) = match spawn_logger(config.paths.activity_log.clone()) {
        Ok((handle, join)) => (handle, Some(join)),
        Err(err) => {
            eprintln!("devkit: activity log disabled: {err}");
            (ActivityLoggerHandle::disconnected(), None)
        }
    };
    let started = Instant::now();
    logger.send(ActivityEvent::SessionStarted {
        version: env!("CARGO_PKG_VERSION").to_string(),
    });
    if let Some(err) = fallback {
        logger.send(ActivityEvent::ConfigFallback {
            code: err.code().to_string(),
            message: err.to_string(),
        });
    }

    let result = tui::run(config, Collaborators::system(logger.clone()));

    if let Err(err) = &result {
        logger.send(ActivityEvent::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        });
    }
    logger.send(ActivityEvent::SessionStopped {
        uptime_secs: started.elapsed().as_secs(),
    });
    logger.shutdown();
    if let Some(join) = logger_join {
        let _ = join.join();
    }
    Ok(result?)
}

// ──────────────────── status ────────────────────

fn run_status(cli: &Cli) -> Result<(), CliError> {
    let registry = ToolRegistry::builtin();
    let pm = SystemPackageManager::new();
    let report = scan_status(&pm, registry)?;

    match output_mode(cli) {
        OutputMode::Human => {
            let manager = report.manager.map_or("none", |m| m.label());
            println!("{} {}", "package manager:".bold(), manager);
            for tool in registry.all() {
                let installed = report.installed.get(tool.id).copied().unwrap_or(false);
                let mark = if installed {
                    "\u{2713}".green()
                } else {
                    "\u{2717}".red()
                };
                println!("  {mark} {:<10} {}", tool.id, tool.description.dimmed());
            }
        }
        OutputMode::Json => {
            let tools: Vec<Value> = registry
                .all()
                .iter()
                .map(|tool| {
                    json!({
                        "id": tool.id,
                        "name": tool.name,
                        "installed": report.installed.get(tool.id).copied().unwrap_or(false),
                    })
                })
                .collect();
            write_json_line(&json!({
                "command": "status",
                "manager": report.manager,
                "tools": tools,
            }))?;
        }
    }
    Ok(())
}

// ──────────────────── backups ────────────────────

fn run_backups(cli: &Cli, args: &BackupsArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let store = BackupStore::open(config.paths.backup_dir.clone());
    let mode = output_mode(cli);

    match &args.command {
        BackupCommand::List => {
            let snapshots = store.list();
            match mode {
                OutputMode::Human => {
                    if snapshots.is_empty() {
                        println!("no snapshots in {}", store.dir().display());
                    }
                    for snap in &snapshots {
                        println!(
                            "{:<22} {:<26} {:>3} file(s) {:>9} bytes",
                            snap.id.bold(),
                            snap.created_at,
                            snap.file_count,
                            snap.total_bytes
                        );
                    }
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "backups list",
                    "snapshots": snapshots,
                }))?,
            }
            Ok(())
        }
        BackupCommand::Create => {
            let report = store.create(&config.resolved_tracked_files())?;
            let pruned = store.prune(config.backup.max_backups.max(1))?;
            match mode {
                OutputMode::Human => {
                    println!(
                        "{} {} ({} file(s), {} missing, {} failed, {} pruned)",
                        "created".green(),
                        report.snapshot.id,
                        report.snapshot.file_count,
                        report.skipped.len(),
                        report.failed.len(),
                        pruned.removed_ids.len()
                    );
                    for failure in &report.failed {
                        eprintln!("  {} {}: {}", failure.code.red(), failure.path.display(), failure.message);
                    }
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "backups create",
                    "report": report,
                    "pruned": pruned,
                }))?,
            }
            if report.failed.is_empty() {
                Ok(())
            } else {
                Err(CliError::Partial(format!(
                    "{} file(s) could not be backed up",
                    report.failed.len()
                )))
            }
        }
        BackupCommand::Restore { id } => {
            let report = store.restore(id)?;
            match mode {
                OutputMode::Human => {
                    println!("{} {} file(s) from {}", "restored".green(), report.restored, report.id);
                    for failure in &report.failed {
                        eprintln!("  {} {}: {}", failure.code.red(), failure.path.display(), failure.message);
                    }
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "backups restore",
                    "report": report,
                }))?,
            }
            if report.failed.is_empty() {
                Ok(())
            } else {
                Err(CliError::Partial(format!(
                    "{} file(s) could not be restored",
                    report.failed.len()
                )))
            }
        }
        BackupCommand::Delete { id } => {
            store.delete(id)?;
            match mode {
                OutputMode::Human => println!("{} {id}", "deleted".yellow()),
                OutputMode::Json => write_json_line(&json!({
                    "command": "backups delete",
                    "id": id,
                }))?,
            }
            Ok(())
        }
    }
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            match output_mode(cli) {
                OutputMode::Human => println!("{}", path.display()),
                OutputMode::Json => write_json_line(&json!({
                    "command": "config path",
                    "path": path,
                    "exists": path.exists(),
                }))?,
            }
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(cli)?;
            match output_mode(cli) {
                OutputMode::Human => {
                    let body = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("failed to render config: {e}")))?;
                    print!("{body}");
                }
                OutputMode::Json => write_json_line(&serde_json::to_value(&config)?)?,
            }
            Ok(())
        }
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("DEVKIT_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_opens_console() {
        let cli = Cli::try_parse_from(["devkit"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_subcommands() {
        let cases = [
            vec!["devkit", "console", "--no-intro", "--theme", "mono", "--no-mouse"],
            vec!["devkit", "status", "--json"],
            vec!["devkit", "backups", "list"],
            vec!["devkit", "backups", "create"],
            vec!["devkit", "backups", "restore", "20260101-120000"],
            vec!["devkit", "backups", "delete", "20260101-120000"],
            vec!["devkit", "config", "path"],
            vec!["devkit", "--config", "/tmp/devkit.toml", "config", "show"],
            vec!["devkit", "completions", "zsh"],
        ];
        for case in cases {
            let parsed = Cli::try_parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse case: {case:?}");
        }
    }

    #[test]
    fn unknown_theme_is_rejected() {
        assert!(Cli::try_parse_from(["devkit", "console", "--theme", "neon"]).is_err());
        let cli = Cli::try_parse_from(["devkit", "console", "--theme", "high-contrast"]).unwrap();
        let Some(Command::Console(args)) = cli.command else {
            panic!("expected console");
        };
        assert_eq!(args.theme, Some(ThemeName::HighContrast));
    }

    #[test]
    fn restore_requires_an_id() {
        assert!(Cli::try_parse_from(["devkit", "backups", "restore"]).is_err());
    }

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::from(DevkitError::NoPackageManagerDetected).exit_code(), 1);
        let runtime = DevkitError::Runtime {
            details: "x".to_string(),
        };
        assert_eq!(CliError::from(runtime).exit_code(), 2);
        assert_eq!(CliError::Partial("p".to_string()).exit_code(), 4);
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(resolve_output_mode(true, Some("human"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("json"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("human"), false), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None, true), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, Some("auto"), false), OutputMode::Json);
    }
}
