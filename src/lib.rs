#![forbid(unsafe_code)]

//! devkit console: an interactive terminal console that installs, updates,
//! configures and backs up a developer-environment toolset.
//!
//! The console follows a message/update/render loop:
//! 1. **Model** ([`tui::model::AppModel`]) holds every piece of screen state
//! 2. **Update** ([`tui::update::update`]) is a pure transition yielding a [`tui::model::Cmd`]
//! 3. **Engine** ([`tui::Engine`]) performs commands and feeds results back as messages
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use devkit_console::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use devkit_console::core::config::Config;
//! use devkit_console::backup::store::BackupStore;
//! ```

pub mod prelude;

pub mod backup;
pub mod core;
pub mod logger;
pub mod platform;
pub mod tools;
pub mod tui;
