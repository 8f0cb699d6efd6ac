//! DVK-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DevkitError>;

/// Number of trailing output lines kept as context for a failed process.
pub const FAILURE_CONTEXT_LINES: usize = 10;

/// Top-level error type for the devkit console.
#[derive(Debug, Error)]
pub enum DevkitError {
    #[error("[DVK-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DVK-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DVK-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DVK-1004] configuration load failed for {path}, using defaults: {details}")]
    ConfigLoadFailed { path: PathBuf, details: String },

    #[error("[DVK-2001] no supported package manager detected")]
    NoPackageManagerDetected,

    #[error("[DVK-2002] privilege escalation denied for {operation}")]
    PrivilegeDenied { operation: String },

    #[error("[DVK-2003] `{command}` failed ({status})")]
    ProcessExecutionFailed {
        command: String,
        status: String,
        last_lines: Vec<String>,
    },

    #[error("[DVK-2004] unknown tool: {id}")]
    UnknownTool { id: String },

    #[error("[DVK-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DVK-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DVK-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[DVK-3004] backup IO failure at {path}: {details}")]
    BackupIo { path: PathBuf, details: String },

    #[error("[DVK-3005] backup not found: {id}")]
    BackupNotFound { id: String },

    #[error("[DVK-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DevkitError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "DVK-1001",
            Self::MissingConfig { .. } => "DVK-1002",
            Self::ConfigParse { .. } => "DVK-1003",
            Self::ConfigLoadFailed { .. } => "DVK-1004",
            Self::NoPackageManagerDetected => "DVK-2001",
            Self::PrivilegeDenied { .. } => "DVK-2002",
            Self::ProcessExecutionFailed { .. } => "DVK-2003",
            Self::UnknownTool { .. } => "DVK-2004",
            Self::Serialization { .. } => "DVK-2101",
            Self::Io { .. } => "DVK-3002",
            Self::ChannelClosed { .. } => "DVK-3003",
            Self::BackupIo { .. } => "DVK-3004",
            Self::BackupNotFound { .. } => "DVK-3005",
            Self::Runtime { .. } => "DVK-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::ProcessExecutionFailed { .. }
                | Self::PrivilegeDenied { .. }
                | Self::BackupIo { .. }
                | Self::Runtime { .. }
        )
    }

    /// Whether the error aborts a whole install/update batch rather than one item.
    #[must_use]
    pub const fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoPackageManagerDetected | Self::PrivilegeDenied { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a process failure from an exit description and the transcript tail.
    #[must_use]
    pub fn process_failed(command: impl Into<String>, status: impl Into<String>, transcript: &[String]) -> Self {
        let start = transcript.len().saturating_sub(FAILURE_CONTEXT_LINES);
        Self::ProcessExecutionFailed {
            command: command.into(),
            status: status.into(),
            last_lines: transcript[start..].to_vec(),
        }
    }
}

impl From<serde_json::Error> for DevkitError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DevkitError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DevkitError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<DevkitError> {
        vec![
            DevkitError::InvalidConfig {
                details: String::new(),
            },
            DevkitError::MissingConfig {
                path: PathBuf::new(),
            },
            DevkitError::ConfigParse {
                context: "",
                details: String::new(),
            },
            DevkitError::ConfigLoadFailed {
                path: PathBuf::new(),
                details: String::new(),
            },
            DevkitError::NoPackageManagerDetected,
            DevkitError::PrivilegeDenied {
                operation: String::new(),
            },
            DevkitError::ProcessExecutionFailed {
                command: String::new(),
                status: String::new(),
                last_lines: Vec::new(),
            },
            DevkitError::UnknownTool { id: String::new() },
            DevkitError::Serialization {
                context: "",
                details: String::new(),
            },
            DevkitError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            DevkitError::ChannelClosed { component: "" },
            DevkitError::BackupIo {
                path: PathBuf::new(),
                details: String::new(),
            },
            DevkitError::BackupNotFound { id: String::new() },
            DevkitError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = all_variants().iter().map(DevkitError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_dvk_prefix() {
        for err in &all_variants() {
            assert!(
                err.code().starts_with("DVK-"),
                "code {} must start with DVK-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = DevkitError::UnknownTool {
            id: "lazygit".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DVK-2004"), "display should contain code: {msg}");
        assert!(msg.contains("lazygit"), "display should contain id: {msg}");
    }

    #[test]
    fn batch_fatal_errors() {
        assert!(DevkitError::NoPackageManagerDetected.is_batch_fatal());
        assert!(
            DevkitError::PrivilegeDenied {
                operation: "install".into()
            }
            .is_batch_fatal()
        );
        assert!(!DevkitError::UnknownTool { id: "x".into() }.is_batch_fatal());
    }

    #[test]
    fn process_failed_keeps_only_tail_of_transcript() {
        let transcript: Vec<String> = (0..25).map(|i| format!("line {i}")).collect();
        let err = DevkitError::process_failed("apt-get install git", "exit status: 100", &transcript);
        match err {
            DevkitError::ProcessExecutionFailed { last_lines, .. } => {
                assert_eq!(last_lines.len(), FAILURE_CONTEXT_LINES);
                assert_eq!(last_lines.first().map(String::as_str), Some("line 15"));
                assert_eq!(last_lines.last().map(String::as_str), Some("line 24"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn io_convenience_constructor() {
        let err = DevkitError::io(
            "/tmp/test.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "DVK-3002");
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: DevkitError = json_err.into();
        assert_eq!(err.code(), "DVK-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: DevkitError = toml_err.into();
        assert_eq!(err.code(), "DVK-1003");
    }
}
