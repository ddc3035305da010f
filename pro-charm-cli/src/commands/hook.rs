//! `ubuntu-pro-charm hook` and `dispatch`: the Juju entry points.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use pro_charm_host::{juju, ProxyEnv, SystemRunner};
use pro_charm_reconcile::{HookToolPublisher, Reconciler};

use crate::Paths;

/// Set by Juju to the hook path it dispatched, e.g. `hooks/config-changed`.
pub const DISPATCH_PATH_VAR: &str = "JUJU_DISPATCH_PATH";

/// Arguments for `ubuntu-pro-charm hook`.
#[derive(Args, Debug)]
pub struct HookArgs {
    /// Hook name, e.g. `config-changed`.
    pub name: String,
}

impl HookArgs {
    pub fn run(self, paths: &Paths) -> Result<()> {
        run_hook(&self.name, paths)
    }
}

/// Arguments for `ubuntu-pro-charm dispatch`.
#[derive(Args, Debug)]
pub struct DispatchArgs {
    /// Dispatched hook path; only the final component is used.
    #[arg(long, env = DISPATCH_PATH_VAR)]
    pub path: String,
}

impl DispatchArgs {
    pub fn run(self, paths: &Paths) -> Result<()> {
        let name = hook_name(&self.path)
            .with_context(|| format!("cannot derive a hook name from '{}'", self.path))?;
        run_hook(name, paths)
    }
}

/// `hooks/config-changed` → `config-changed`.
pub fn hook_name(dispatch_path: &str) -> Option<&str> {
    Path::new(dispatch_path.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
}

fn run_hook(name: &str, paths: &Paths) -> Result<()> {
    match name {
        // Juju always follows install and upgrade-charm with config-changed.
        "config-changed" => config_changed(paths),
        other => {
            tracing::debug!(hook = other, "no handler registered");
            Ok(())
        }
    }
}

fn config_changed(paths: &Paths) -> Result<()> {
    let runner = SystemRunner;
    let config = juju::config_get(&runner).context("failed to read charm configuration")?;
    let proxy = ProxyEnv::from_config(&config);

    let reconciler = Reconciler::new(&runner, paths.store(), paths.client_config.clone());
    let mut sink = HookToolPublisher::new(&runner);
    let status = reconciler
        .config_changed(&config, &proxy, &mut sink)
        .context("config-changed failed")?;

    tracing::info!(
        state = status.state_name(),
        message = status.message(),
        "config-changed complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_name_from_dispatch_path() {
        assert_eq!(hook_name("hooks/config-changed"), Some("config-changed"));
        assert_eq!(hook_name("config-changed\n"), Some("config-changed"));
        assert_eq!(hook_name("actions/refresh"), Some("refresh"));
        assert_eq!(hook_name(""), None);
    }
}
