//! Configuration system: TOML file + env var overrides + smart defaults.
//!
//! Load failures in the console never block startup: [`Config::load_or_default`]
//! degrades to compiled defaults and hands back the error for logging.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DevkitError, Result};

/// Upper bound accepted for `console.log_capacity`.
pub const MAX_LOG_CAPACITY: usize = 10_000;

/// Full devkit configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub console: ConsoleConfig,
    pub paths: PathsConfig,
    pub backup: BackupConfig,
    /// Per-target tool settings, keyed by target id then field key.
    pub tools: BTreeMap<String, BTreeMap<String, String>>,
    pub profiles: Vec<UserProfile>,
    pub active_profile: Option<String>,
}

/// Interactive console behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Show the intro animation before the welcome screen.
    pub intro: bool,
    /// Number of ticks the intro runs before auto-advancing.
    pub intro_frames: u32,
    /// Tick interval in milliseconds.
    pub tick_ms: u64,
    /// Maximum number of lines kept in the operation log.
    pub log_capacity: usize,
    pub theme: ThemeName,
    /// Enable mouse capture.
    pub mouse: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            intro: true,
            intro_frames: 24,
            tick_ms: 80,
            log_capacity: 500,
            theme: ThemeName::default(),
            mouse: true,
        }
    }
}

/// Selectable color themes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    #[default]
    Default,
    HighContrast,
    Mono,
}

impl ThemeName {
    pub const ALL: [Self; 3] = [Self::Default, Self::HighContrast, Self::Mono];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::HighContrast => "high-contrast",
            Self::Mono => "mono",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.label().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub backup_dir: PathBuf,
    pub activity_log: PathBuf,
}

/// Backup snapshot behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackupConfig {
    /// Files captured by each snapshot. Relative paths resolve against `$HOME`.
    pub tracked_files: Vec<PathBuf>,
    /// Snapshots kept after pruning.
    pub max_backups: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            tracked_files: [
                ".gitconfig",
                ".zshrc",
                ".bashrc",
                ".tmux.conf",
                ".config/nvim/init.lua",
                ".config/starship.toml",
                ".ssh/config",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            max_backups: 10,
        }
    }
}

/// Named user profile applied to tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub editor: String,
    pub shell: String,
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[DVK-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home = home_dir();
        let data = home.join(".local").join("share").join("devkit");
        Self {
            config_file: home.join(".config").join("devkit").join("config.toml"),
            backup_dir: data.join("backups"),
            activity_log: data.join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| DevkitError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(DevkitError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config, degrading to defaults on any failure.
    ///
    /// The returned error (if any) is a [`DevkitError::ConfigLoadFailed`] meant
    /// for the activity log; the console continues with the defaults.
    pub fn load_or_default(path: Option<&Path>) -> (Self, Option<DevkitError>) {
        match Self::load(path) {
            Ok(cfg) => (cfg, None),
            Err(err) => {
                let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
                let mut cfg = Self::default();
                cfg.paths.config_file.clone_from(&path_buf);
                (
                    cfg,
                    Some(DevkitError::ConfigLoadFailed {
                        path: path_buf,
                        details: err.to_string(),
                    }),
                )
            }
        }
    }

    /// Persist the config to `paths.config_file` atomically (temp file + rename).
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.paths.config_file.clone();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| DevkitError::io(parent, source))?;
        }
        let body = toml::to_string_pretty(self)?;

        let tmp_path = path.with_extension("toml.tmp");
        {
            let mut file =
                fs::File::create(&tmp_path).map_err(|source| DevkitError::io(&tmp_path, source))?;
            file.write_all(body.as_bytes())
                .map_err(|source| DevkitError::io(&tmp_path, source))?;
            file.sync_all()
                .map_err(|source| DevkitError::io(&tmp_path, source))?;
        }
        fs::rename(&tmp_path, &path).map_err(|source| DevkitError::io(&path, source))?;
        Ok(path)
    }

    /// Current value of a tool setting, if one was stored.
    #[must_use]
    pub fn tool_setting(&self, target: &str, key: &str) -> Option<&str> {
        self.tools
            .get(target)
            .and_then(|fields| fields.get(key))
            .map(String::as_str)
    }

    /// Store a tool setting value.
    pub fn set_tool_setting(&mut self, target: &str, key: &str, value: String) {
        self.tools
            .entry(target.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Resolve tracked backup files to absolute paths.
    #[must_use]
    pub fn resolved_tracked_files(&self) -> Vec<PathBuf> {
        let home = home_dir();
        self.backup
            .tracked_files
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    home.join(p)
                }
            })
            .collect()
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_bool("DEVKIT_INTRO", &mut self.console.intro)?;
        set_env_bool("DEVKIT_MOUSE", &mut self.console.mouse)?;
        set_env_u64("DEVKIT_TICK_MS", &mut self.console.tick_ms)?;
        set_env_usize("DEVKIT_LOG_CAPACITY", &mut self.console.log_capacity)?;
        if let Some(raw) = env_var("DEVKIT_THEME") {
            self.console.theme = ThemeName::parse(&raw).ok_or_else(|| DevkitError::ConfigParse {
                context: "env",
                details: format!("DEVKIT_THEME={raw:?}: unknown theme"),
            })?;
        }
        if let Some(raw) = env_var("DEVKIT_BACKUP_DIR") {
            self.paths.backup_dir = PathBuf::from(raw);
        }
        if let Some(raw) = env_var("DEVKIT_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.console.log_capacity == 0 || self.console.log_capacity > MAX_LOG_CAPACITY {
            return Err(DevkitError::InvalidConfig {
                details: format!(
                    "console.log_capacity must be in [1, {MAX_LOG_CAPACITY}], got {}",
                    self.console.log_capacity
                ),
            });
        }
        if self.console.tick_ms < 10 {
            return Err(DevkitError::InvalidConfig {
                details: format!(
                    "console.tick_ms must be >= 10, got {}",
                    self.console.tick_ms
                ),
            });
        }
        if self.backup.max_backups == 0 {
            return Err(DevkitError::InvalidConfig {
                details: "backup.max_backups must be at least 1".to_string(),
            });
        }
        if let Some(active) = &self.active_profile
            && !self.profiles.iter().any(|p| &p.name == active)
        {
            return Err(DevkitError::InvalidConfig {
                details: format!("active_profile {active:?} does not name a profile"),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| DevkitError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<usize>().map_err(|error| DevkitError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(DevkitError::ConfigParse {
                    context: "env",
                    details: format!("{name}={raw:?}: expected a boolean"),
                });
            }
        };
    }
    Ok(())
}
