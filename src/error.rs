//! Error types for Infra Snitch
//!
//! Missing metrics are never errors: rules branch on them and report a
//! finding. The variants here cover what can actually go wrong around the
//! engine (reading snapshots, probing the host, writing reports) plus the
//! defect channel a rule uses when its input is malformed.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Infra Snitch operations
#[derive(Error, Debug)]
pub enum SnitchError {
    /// I/O error while reading a snapshot or writing a report
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Snapshot file could not be parsed
    #[error("Invalid metric snapshot '{path}': {message}")]
    SnapshotParse {
        /// Snapshot file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Metric source failed as a whole
    #[error("Metric collection error: {0}")]
    CollectionError(String),

    /// A rule evaluator hit input it cannot interpret
    #[error("Rule '{rule}' could not evaluate snapshot: {message}")]
    RuleDefect {
        /// Rule identifier
        rule: String,
        /// What the rule could not interpret
        message: String,
    },

    /// A renderer could not produce its output
    #[error("Failed to render {format} report: {message}")]
    RenderError {
        /// Output format name
        format: String,
        /// Renderer message
        message: String,
    },

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SnitchError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a rule defect error
    pub fn rule_defect(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleDefect {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Create a rendering error
    pub fn render(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RenderError {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::NotFound(path) | Self::SnapshotParse { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// Result type alias for Infra Snitch operations
pub type Result<T> = std::result::Result<T, SnitchError>;

impl From<std::io::Error> for SnitchError {
    fn from(err: std::io::Error) -> Self {
        SnitchError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SnitchError {
    fn from(err: serde_json::Error) -> Self {
        SnitchError::Serialization(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SnitchError::io(path, e))
    }
}
