//! Error types for pro-charm-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from state and client-config operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted state file exists but is not valid JSON.
    #[error("failed to parse unit state at {path}: {source}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (save path).
    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `uaclient.conf` parsed, but its top level is not a mapping.
    #[error("client configuration at {path} is not a YAML mapping")]
    NotAMapping { path: PathBuf },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
