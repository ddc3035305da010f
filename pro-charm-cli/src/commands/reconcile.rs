//! `ubuntu-pro-charm reconcile`: one pass outside of a Juju hook.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use pro_charm_core::DesiredConfig;
use pro_charm_host::{ProxyEnv, SystemRunner};
use pro_charm_reconcile::{Reconciler, RecordingPublisher};

use super::render_status;
use crate::Paths;

/// Arguments for `ubuntu-pro-charm reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// YAML file with the same keys as the charm's configuration.
    #[arg(long)]
    pub config: PathBuf,

    /// Print the final status as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReconcileArgs {
    pub fn run(self, paths: &Paths) -> Result<()> {
        let config = load_config(&self.config)?;
        let proxy = ProxyEnv::from_config(&config);

        let reconciler = Reconciler::new(SystemRunner, paths.store(), paths.client_config.clone());
        let mut sink = RecordingPublisher::new();
        let result = reconciler.config_changed(&config, &proxy, &mut sink);

        if !self.json {
            for status in sink.history() {
                println!("{}", render_status(status));
            }
        }
        let status = result.context("reconciliation failed")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize status")?
            );
        }
        Ok(())
    }
}

/// An empty file is an empty configuration.
pub fn load_config(path: &Path) -> Result<DesiredConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(DesiredConfig::default());
    }
    serde_yaml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))
}
