//! Ubuntu Pro charm core library: domain types, persisted state, errors.
//!
//! Public API surface:
//! - [`types`]: declared configuration, persisted state, service status, unit status
//! - [`error`]: [`CoreError`]
//! - [`state`]: load / save of the persisted unit state
//! - [`client_config`]: read-modify-write of `uaclient.conf`
//! - [`digest`]: SHA-256 hashing of secrets

pub mod client_config;
pub mod digest;
pub mod error;
pub mod state;
pub mod types;

pub use error::CoreError;
pub use types::{DesiredConfig, PersistedState, ServiceEntry, ServiceStatus, UnitStatus};
