//! Host collaborators: package managers and privilege escalation.

pub mod pkg;
pub mod privilege;
