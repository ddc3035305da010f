//! Juju hook tools.
//!
//! Inside a hook, Juju puts `config-get`, `status-set` and friends on `PATH`.
//! These are the only two this charm needs.

use pro_charm_core::{DesiredConfig, UnitStatus};

use crate::error::HostError;
use crate::runner::{CommandRunner, CommandSpec};

/// Read the unit's charm configuration.
pub fn config_get(runner: &impl CommandRunner) -> Result<DesiredConfig, HostError> {
    let cmd = CommandSpec::new("config-get").arg("--format=json");
    let output = runner.check(&cmd)?;
    let stdout = output.stdout.trim();
    // An application with no config at all prints `null`.
    if stdout.is_empty() || stdout == "null" {
        return Ok(DesiredConfig::default());
    }
    serde_json::from_str(stdout).map_err(|source| HostError::Parse {
        command: cmd.to_string(),
        source,
    })
}

/// Publish the unit's workload status.
pub fn status_set(runner: &impl CommandRunner, status: &UnitStatus) -> Result<(), HostError> {
    runner.check(
        &CommandSpec::new("status-set")
            .arg(status.state_name())
            .arg(status.message()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use crate::testing::ScriptedRunner;

    #[test]
    fn config_get_parses_json() {
        let runner = ScriptedRunner::new();
        runner.on(
            "config-get",
            &[],
            CommandOutput::success(r#"{"token": "tok\n", "ppa": "", "contract_url": "https://contracts.canonical.com"}"#),
        );
        let config = config_get(&runner).unwrap();
        assert_eq!(config.token(), Some("tok"));
        assert_eq!(config.ppa(), None);
        assert_eq!(config.contract_url(), Some("https://contracts.canonical.com"));
        assert_eq!(runner.commands(), vec!["config-get --format=json"]);
    }

    #[test]
    fn config_get_null_is_default() {
        let runner = ScriptedRunner::new();
        runner.on("config-get", &[], CommandOutput::success("null\n"));
        assert_eq!(config_get(&runner).unwrap(), DesiredConfig::default());
    }

    #[test]
    fn status_set_passes_state_and_message() {
        let runner = ScriptedRunner::new();
        status_set(&runner, &UnitStatus::blocked("No token configured")).unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].program, "status-set");
        assert_eq!(calls[0].args, vec!["blocked", "No token configured"]);
    }
}
