//! # pro-charm-reconcile
//!
//! Brings a host in line with the declared Ubuntu Pro configuration.
//!
//! Build a [`Reconciler`] around a [`pro_charm_host::CommandRunner`] and a
//! [`pro_charm_core::state::StateStore`], then call
//! [`Reconciler::config_changed`] once per hook with a [`StatusSink`] to
//! publish through.

pub mod error;
pub mod publisher;
pub mod reconciler;

pub use error::ReconcileError;
pub use publisher::{HookToolPublisher, RecordingPublisher, StatusSink};
pub use reconciler::{redact, Reconciler, NO_TOKEN_MESSAGE};
