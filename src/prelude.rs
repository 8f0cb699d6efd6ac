//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use devkit_console::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, ThemeName, UserProfile};
pub use crate::core::errors::{DevkitError, Result};

// Platform
pub use crate::platform::pkg::{ManagerKind, PackageManager, SystemPackageManager};
pub use crate::platform::privilege::{PrivilegeEscalator, SudoEscalator};

// Tools
pub use crate::tools::registry::{Tool, ToolRegistry};
pub use crate::tools::targets::ConfigTarget;

// Backups
pub use crate::backup::store::{BackupSnapshot, BackupStore};

// Logging
pub use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};

// Console
pub use crate::tui::model::{AppModel, Cmd, Msg, Screen};
pub use crate::tui::{Collaborators, Engine, TerminalControl};
