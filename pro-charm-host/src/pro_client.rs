//! Pro client (`ubuntu-advantage`) invocations.
//!
//! The token is handed to `attach` through a private attach-config file so it
//! never shows up in the process table.

use std::io::Write;

use serde::Serialize;

use pro_charm_core::ServiceStatus;

use crate::error::{io_err, HostError};
use crate::retry::{retry_if, RetryPolicy};
use crate::runner::{CommandRunner, CommandSpec};

pub const PRO_CLIENT: &str = "ubuntu-advantage";

/// Proxy keys the Pro client keeps in its own configuration.
pub const PROXY_KEYS: [&str; 2] = ["http_proxy", "https_proxy"];

fn pro() -> CommandSpec {
    CommandSpec::new(PRO_CLIENT)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Query attachment and per-service state.
pub fn status(runner: &impl CommandRunner) -> Result<ServiceStatus, HostError> {
    let cmd = pro().args(["status", "--all", "--format", "json"]);
    let output = runner.check(&cmd)?;
    parse_status(&cmd.to_string(), &output.stdout)
}

pub(crate) fn parse_status(command: &str, stdout: &str) -> Result<ServiceStatus, HostError> {
    serde_json::from_str(stdout.trim()).map_err(|source| HostError::Parse {
        command: command.to_owned(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Attach / detach
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AttachConfig<'a> {
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_services: Option<&'a [String]>,
}

/// Attach with `token`, retrying failed attempts per `policy`.
///
/// With `services` set, only those services are enabled; otherwise the
/// client's auto-enable defaults apply.
pub fn attach(
    runner: &impl CommandRunner,
    token: &str,
    services: Option<&[String]>,
    policy: &RetryPolicy,
) -> Result<(), HostError> {
    let config = AttachConfig {
        token,
        enable_services: services,
    };
    let yaml = serde_yaml::to_string(&config)?;

    // NamedTempFile is created 0600 and removed on drop.
    let mut file = tempfile::Builder::new()
        .prefix("pro-attach-")
        .suffix(".yaml")
        .tempfile()
        .map_err(|e| io_err(std::env::temp_dir(), e))?;
    if let Err(e) = file.write_all(yaml.as_bytes()).and_then(|()| file.flush()) {
        return Err(io_err(file.path(), e));
    }

    let cmd = pro()
        .arg("attach")
        .arg("--attach-config")
        .arg(file.path().to_string_lossy());

    tracing::info!(services = ?services, "attaching Ubuntu Pro subscription");
    retry_if(policy, HostError::is_transient, || runner.check(&cmd))?;
    Ok(())
}

pub fn detach(runner: &impl CommandRunner) -> Result<(), HostError> {
    tracing::info!("detaching Ubuntu Pro subscription");
    runner.check(&pro().args(["detach", "--assume-yes"]))?;
    Ok(())
}

pub fn enable_service(runner: &impl CommandRunner, service: &str) -> Result<(), HostError> {
    tracing::info!(service, "enabling Ubuntu Pro service");
    runner.check(&pro().args(["enable", service, "--assume-yes"]))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// `config set key=value` when `value` is present, `config unset key` otherwise.
pub fn set_config(
    runner: &impl CommandRunner,
    key: &str,
    value: Option<&str>,
) -> Result<(), HostError> {
    let cmd = match value {
        Some(value) => pro().args(["config", "set"]).arg(format!("{key}={value}")),
        None => pro().args(["config", "unset", key]),
    };
    runner.check(&cmd)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use crate::testing::ScriptedRunner;
    use std::cell::RefCell;
    use std::rc::Rc;

    const STATUS_ATTACHED: &str = r#"{
        "attached": true,
        "services": [
            {"name": "esm-apps", "status": "enabled"},
            {"name": "esm-infra", "status": "enabled"},
            {"name": "livepatch", "status": "enabled"}
        ]
    }"#;

    const STATUS_DETACHED: &str = r#"{
        "attached": false,
        "services": [
            {"name": "esm-apps", "available": "yes"},
            {"name": "esm-infra", "available": "yes"}
        ]
    }"#;

    #[test]
    fn status_parses_attached_output() {
        let runner = ScriptedRunner::new();
        runner.on(PRO_CLIENT, &["status"], CommandOutput::success(STATUS_ATTACHED));
        let status = status(&runner).unwrap();
        assert!(status.attached);
        assert_eq!(status.enabled_services(), vec!["esm-apps", "esm-infra", "livepatch"]);
        assert_eq!(
            runner.commands(),
            vec!["ubuntu-advantage status --all --format json"]
        );
    }

    #[test]
    fn status_tolerates_missing_status_fields() {
        let status = parse_status("status", STATUS_DETACHED).unwrap();
        assert!(!status.attached);
        assert!(status.enabled_services().is_empty());
    }

    #[test]
    fn status_rejects_garbage() {
        let err = parse_status("ubuntu-advantage status", "Traceback (most recent call last)")
            .unwrap_err();
        assert!(matches!(err, HostError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn status_failure_is_command_failed() {
        let runner = ScriptedRunner::new();
        runner.on(PRO_CLIENT, &["status"], CommandOutput::failure(1, "not root"));
        let err = status(&runner).unwrap_err();
        assert!(matches!(err, HostError::CommandFailed { .. }), "got: {err}");
    }

    fn capture_attach_config(runner: &ScriptedRunner) -> Rc<RefCell<Vec<String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        runner.on_fn(PRO_CLIENT, &["attach"], move |inv| {
            let path = inv.args.last().cloned().unwrap_or_default();
            sink.borrow_mut()
                .push(std::fs::read_to_string(path).unwrap_or_default());
            CommandOutput::success("")
        });
        seen
    }

    #[test]
    fn attach_passes_token_through_config_file() {
        let runner = ScriptedRunner::new();
        let seen = capture_attach_config(&runner);

        attach(&runner, "test-token", None, &RetryPolicy::immediate(3)).unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("ubuntu-advantage attach --attach-config "));
        assert!(!commands[0].contains("test-token"));

        let configs = seen.borrow();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&configs[0]).unwrap();
        assert_eq!(parsed["token"].as_str(), Some("test-token"));
        assert!(parsed.get("enable_services").is_none());
    }

    #[test]
    fn attach_restricts_services_when_declared() {
        let runner = ScriptedRunner::new();
        let seen = capture_attach_config(&runner);
        let services = vec!["esm-infra".to_string(), "cis".to_string()];

        attach(&runner, "test-token", Some(&services), &RetryPolicy::immediate(1)).unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&seen.borrow()[0]).unwrap();
        let enabled: Vec<&str> = parsed["enable_services"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(enabled, vec!["esm-infra", "cis"]);
    }

    #[test]
    fn attach_retries_then_reports_last_failure() {
        let runner = ScriptedRunner::new();
        runner.on(PRO_CLIENT, &["attach"], CommandOutput::failure(1, "Invalid token"));

        let err = attach(&runner, "bad", None, &RetryPolicy::immediate(3)).unwrap_err();

        assert_eq!(err.detail(), "Invalid token");
        assert_eq!(runner.commands_matching(PRO_CLIENT, &["attach"]).len(), 3);
    }

    #[test]
    fn attach_config_file_is_removed_afterwards() {
        let runner = ScriptedRunner::new();
        attach(&runner, "test-token", None, &RetryPolicy::immediate(1)).unwrap();
        let path = runner.calls()[0].args.last().cloned().unwrap();
        assert!(!std::path::Path::new(&path).exists());
    }

    #[test]
    fn set_config_sets_or_unsets() {
        let runner = ScriptedRunner::new();
        set_config(&runner, "http_proxy", Some("http://localhost:3128")).unwrap();
        set_config(&runner, "https_proxy", None).unwrap();
        assert_eq!(
            runner.commands(),
            vec![
                "ubuntu-advantage config set http_proxy=http://localhost:3128",
                "ubuntu-advantage config unset https_proxy",
            ]
        );
    }

    #[test]
    fn detach_and_enable_use_assume_yes() {
        let runner = ScriptedRunner::new();
        detach(&runner).unwrap();
        enable_service(&runner, "livepatch").unwrap();
        assert_eq!(
            runner.commands(),
            vec![
                "ubuntu-advantage detach --assume-yes",
                "ubuntu-advantage enable livepatch --assume-yes",
            ]
        );
    }
}
