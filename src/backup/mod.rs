//! Dotfile backup snapshots.

pub mod store;
