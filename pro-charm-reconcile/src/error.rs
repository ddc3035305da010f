//! Error types for pro-charm-reconcile.

use thiserror::Error;

use pro_charm_core::CoreError;
use pro_charm_host::HostError;

/// Errors a reconciliation pass hands back to the hook runner.
///
/// Livepatch and subscription failures never show up here; they become a
/// blocked status instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// An external command or hook tool failed.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// The state store or client configuration could not be read or written.
    #[error("state error: {0}")]
    Core(#[from] CoreError),
}
