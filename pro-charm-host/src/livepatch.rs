//! Canonical Livepatch agent control.

use crate::error::HostError;
use crate::proxy::ProxyEnv;
use crate::runner::{CommandRunner, CommandSpec};

pub const LIVEPATCH: &str = "canonical-livepatch";

/// The hosted Livepatch service, restored when on-prem config is cleared.
pub const DEFAULT_LIVEPATCH_SERVER: &str = "https://livepatch.canonical.com";

fn livepatch() -> CommandSpec {
    CommandSpec::new(LIVEPATCH)
}

pub fn install(runner: &impl CommandRunner, proxy: &ProxyEnv) -> Result<(), HostError> {
    tracing::info!("installing canonical-livepatch snap");
    runner.check(
        &CommandSpec::new("snap")
            .args(["install", LIVEPATCH])
            .envs(proxy.vars()),
    )?;
    Ok(())
}

pub fn set_server(runner: &impl CommandRunner, server: &str) -> Result<(), HostError> {
    tracing::info!(server, "setting livepatch server");
    runner.check(
        &livepatch()
            .arg("config")
            .arg(format!("remote-server={server}")),
    )?;
    Ok(())
}

pub fn enable(runner: &impl CommandRunner, token: &str) -> Result<(), HostError> {
    tracing::info!("enabling livepatch with auth token");
    runner.check(&livepatch().arg("enable").secret_arg(token))?;
    Ok(())
}

pub fn disable(runner: &impl CommandRunner) -> Result<(), HostError> {
    tracing::info!("disabling livepatch");
    runner.check(&livepatch().arg("disable"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use crate::testing::ScriptedRunner;

    #[test]
    fn command_lines() {
        let runner = ScriptedRunner::new();
        install(&runner, &ProxyEnv::default()).unwrap();
        set_server(&runner, "https://livepatch.example.test").unwrap();
        disable(&runner).unwrap();
        enable(&runner, "lp-token").unwrap();
        assert_eq!(
            runner.commands(),
            vec![
                "snap install canonical-livepatch",
                "canonical-livepatch config remote-server=https://livepatch.example.test",
                "canonical-livepatch disable",
                "canonical-livepatch enable lp-token",
            ]
        );
    }

    #[test]
    fn enable_failure_masks_token_in_error() {
        let runner = ScriptedRunner::new();
        runner.on(LIVEPATCH, &["enable"], CommandOutput::failure(1, "bad auth"));
        let err = enable(&runner, "lp-token").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("canonical-livepatch enable ***"), "got: {msg}");
        assert!(!msg.contains("lp-token"));
    }
}
