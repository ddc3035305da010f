//! Error types for pro-charm-host.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from talking to the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The process could not be started at all (binary missing, permission denied).
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited non-zero (or was killed by a signal).
    #[error("command `{command}` failed [exit status: {}]: {}", exit_code_label(.exit_code), .stderr.trim())]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// `ubuntu-advantage status` or `config-get` printed something that is not the expected JSON.
    #[error("unexpected output from `{command}`: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (attach config).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HostError {
    /// Whether retrying the same call might succeed.
    ///
    /// Only a process that ran and failed qualifies; a missing binary or a
    /// parse failure will fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, HostError::CommandFailed { .. })
    }

    /// The most useful one-line description for an operator.
    ///
    /// For failed commands this is the captured stderr (falling back to stdout
    /// when stderr is empty); for everything else the error's display form.
    pub fn detail(&self) -> String {
        match self {
            HostError::CommandFailed { stdout, stderr, .. } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    stdout.trim().to_owned()
                } else {
                    stderr.to_owned()
                }
            }
            other => other.to_string(),
        }
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_owned(), |c| c.to_string())
}

/// Convenience constructor for [`HostError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> HostError {
    HostError::Io {
        path: path.into(),
        source,
    }
}
