//! Tool catalog and per-tool configuration targets.

pub mod registry;
pub mod targets;
