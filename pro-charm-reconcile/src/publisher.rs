//! Where unit statuses go.

use pro_charm_core::UnitStatus;
use pro_charm_host::{juju, CommandRunner, HostError};

/// Receives every status the reconciler publishes, in order.
pub trait StatusSink {
    fn publish(&mut self, status: &UnitStatus) -> Result<(), HostError>;
}

/// Publishes through Juju's `status-set`.
pub struct HookToolPublisher<R> {
    runner: R,
}

impl<R: CommandRunner> HookToolPublisher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> StatusSink for HookToolPublisher<R> {
    fn publish(&mut self, status: &UnitStatus) -> Result<(), HostError> {
        tracing::info!(state = status.state_name(), message = status.message(), "unit status");
        juju::status_set(&self.runner, status)
    }
}

/// Keeps every published status. Used for local runs and tests.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    history: Vec<UnitStatus>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[UnitStatus] {
        &self.history
    }

    /// The status a unit would currently show.
    pub fn current(&self) -> Option<&UnitStatus> {
        self.history.last()
    }
}

impl StatusSink for RecordingPublisher {
    fn publish(&mut self, status: &UnitStatus) -> Result<(), HostError> {
        tracing::info!(state = status.state_name(), message = status.message(), "unit status");
        self.history.push(status.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pro_charm_host::testing::ScriptedRunner;

    #[test]
    fn recording_keeps_order() {
        let mut sink = RecordingPublisher::new();
        sink.publish(&UnitStatus::maintenance("Configuring")).unwrap();
        sink.publish(&UnitStatus::active("Attached (esm-infra)")).unwrap();
        assert_eq!(sink.history().len(), 2);
        assert_eq!(sink.current(), Some(&UnitStatus::active("Attached (esm-infra)")));
    }

    #[test]
    fn hook_tool_calls_status_set() {
        let runner = ScriptedRunner::new();
        let mut sink = HookToolPublisher::new(&runner);
        sink.publish(&UnitStatus::maintenance("Configuring")).unwrap();
        assert_eq!(runner.commands(), vec!["status-set maintenance Configuring"]);
    }
}
