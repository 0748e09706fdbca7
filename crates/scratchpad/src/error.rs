use std::path::PathBuf;

use thiserror::Error;

/// The runtime could not be loaded. Terminal for the session.
///
/// Clonable because every caller awaiting the shared load future receives
/// its own copy of the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LoadError {
    message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A fault in the machinery around a run, not in the user's code.
///
/// Faults raised by user code never become this error; they are rendered
/// into the captured output instead.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{0}")]
    Invocation(String),
    #[error("cannot read `{path}` from the runtime filesystem: {message}")]
    Filesystem { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage backend rejected key `{key}`: {message}")]
    Backend { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard access denied: {0}")]
    Denied(String),
    #[error("no clipboard available")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
