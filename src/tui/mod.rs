//! Interactive console: model/update/render plus the runtime that drives them.
//!
//! Screens are dispatched through the handler registry first and the legacy
//! switch second (see [`handlers`] and [`legacy`]).

#![allow(missing_docs)]

pub mod editor;
pub mod executor;
pub mod handlers;
pub mod input;
pub mod layout;
pub mod legacy;
pub mod log_buffer;
pub mod model;
pub mod navigation;
pub mod render;
pub mod runtime;
pub mod tasks;
pub mod terminal_guard;
pub mod theme;
pub mod update;
pub mod viewport;
pub mod widgets;

#[cfg(test)]
mod test_properties;

pub use runtime::{Collaborators, Engine, TerminalControl, run};
