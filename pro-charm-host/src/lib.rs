//! # pro-charm-host
//!
//! Everything that reaches outside the process: external commands, retry,
//! apt/PPA management, the Pro client, the Livepatch agent, Juju hook tools
//! and the proxy environment handed to child processes.

pub mod apt;
pub mod error;
pub mod juju;
pub mod livepatch;
pub mod pro_client;
pub mod proxy;
pub mod retry;
pub mod runner;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::HostError;
pub use proxy::ProxyEnv;
pub use retry::{retry_if, RetryPolicy};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
