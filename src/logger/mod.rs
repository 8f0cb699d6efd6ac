//! Activity logging: JSONL append-only log fed by a background logger thread.

pub mod activity;
pub mod jsonl;
