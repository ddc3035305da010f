//! Diff declared configuration against persisted state and act on the difference.
//!
//! ## Pass order
//!
//! 1. PPA: remove the old repository, then add the new one.
//! 2. Package: (re)install the Pro client when flagged.
//! 3. Livepatch: point the agent at an on-prem server, or back at the hosted one.
//! 4. Subscription: proxy settings, detach, `uaclient.conf`, attach.
//! 5. Status: publish the enabled services.
//!
//! State is saved after every external action that succeeds and never before,
//! so an interrupted pass leaves it describing the last known-good host.
//! Steps 1–2 propagate failures to the caller; steps 3–4 turn them into a
//! blocked status and end the pass early.

use std::path::PathBuf;

use pro_charm_core::{
    client_config, digest::hash_secret, state::StateStore, DesiredConfig, PersistedState,
    UnitStatus,
};
use pro_charm_host::{apt, livepatch, pro_client, CommandRunner, ProxyEnv, RetryPolicy};

use crate::error::ReconcileError;
use crate::publisher::StatusSink;

pub const NO_TOKEN_MESSAGE: &str = "No token configured";

/// Whether a contained step let the pass continue.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Flow {
    Continue,
    Halt(UnitStatus),
}

pub struct Reconciler<R> {
    runner: R,
    store: StateStore,
    client_config: PathBuf,
    retry: RetryPolicy,
}

impl<R: CommandRunner> Reconciler<R> {
    pub fn new(runner: R, store: StateStore, client_config: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            store,
            client_config: client_config.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the attach retry schedule.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run one full pass and return the final status it published.
    pub fn config_changed(
        &self,
        config: &DesiredConfig,
        proxy: &ProxyEnv,
        sink: &mut dyn StatusSink,
    ) -> Result<UnitStatus, ReconcileError> {
        tracing::info!("beginning config_changed");
        sink.publish(&UnitStatus::maintenance("Configuring"))?;

        let mut state = self.store.load()?;
        self.handle_ppa(config, proxy, &mut state)?;
        self.handle_package(proxy, &mut state)?;

        let mut flow = self.handle_livepatch(config, proxy, &mut state)?;
        if flow == Flow::Continue {
            flow = self.handle_subscription(config, proxy, &mut state)?;
        }
        if let Flow::Halt(status) = flow {
            let status = redact_status(status, &config.secrets());
            sink.publish(&status)?;
            return Ok(status);
        }

        let status = self.handle_status()?;
        sink.publish(&status)?;
        tracing::info!("finished config_changed");
        Ok(status)
    }

    fn save(&self, state: &mut PersistedState) -> Result<(), ReconcileError> {
        self.store.save(state)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // 1. PPA
    // -----------------------------------------------------------------------

    fn handle_ppa(
        &self,
        config: &DesiredConfig,
        proxy: &ProxyEnv,
        state: &mut PersistedState,
    ) -> Result<(), ReconcileError> {
        let new = config.ppa();
        let old = state.ppa.clone();

        if let Some(old_ppa) = old.as_deref().filter(|o| Some(*o) != new) {
            tracing::info!(ppa = old_ppa, "removing previously installed ppa");
            apt::remove_repository(&self.runner, old_ppa, proxy)?;
            state.ppa = None;
            state.package_needs_installing = true;
            self.save(state)?;
        }

        if let Some(new_ppa) = new.filter(|n| old.as_deref() != Some(*n)) {
            tracing::info!(ppa = new_ppa, "installing ppa");
            apt::add_repository(&self.runner, new_ppa, proxy)?;
            state.ppa = Some(new_ppa.to_owned());
            state.package_needs_installing = true;
            self.save(state)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // 2. Package
    // -----------------------------------------------------------------------

    fn handle_package(
        &self,
        proxy: &ProxyEnv,
        state: &mut PersistedState,
    ) -> Result<(), ReconcileError> {
        if !state.package_needs_installing {
            return Ok(());
        }
        apt::install_package(&self.runner, apt::PRO_CLIENT_PACKAGE, proxy)?;
        state.package_needs_installing = false;
        self.save(state)
    }

    // -----------------------------------------------------------------------
    // 3. Livepatch
    // -----------------------------------------------------------------------

    fn handle_livepatch(
        &self,
        config: &DesiredConfig,
        proxy: &ProxyEnv,
        state: &mut PersistedState,
    ) -> Result<Flow, ReconcileError> {
        let result = match (config.livepatch_server_url(), config.livepatch_token()) {
            (Some(server), Some(token)) => {
                let hashed = hash_secret(token);
                let unchanged = state.hashed_livepatch_token.as_deref() == Some(hashed.as_str())
                    && state.livepatch_server_url.as_deref() == Some(server);
                if unchanged {
                    return Ok(Flow::Continue);
                }
                self.configure_livepatch(server, token, hashed, proxy, state)
            }
            _ if state.hashed_livepatch_token.is_some() => self.reset_livepatch(state),
            _ => return Ok(Flow::Continue),
        };
        Ok(contain(result, "Error configuring livepatch"))
    }

    fn configure_livepatch(
        &self,
        server: &str,
        token: &str,
        hashed: String,
        proxy: &ProxyEnv,
        state: &mut PersistedState,
    ) -> Result<(), ReconcileError> {
        if !state.livepatch_installed {
            livepatch::install(&self.runner, proxy)?;
            state.livepatch_installed = true;
            self.save(state)?;
        }
        livepatch::set_server(&self.runner, server)?;
        livepatch::disable(&self.runner)?;
        livepatch::enable(&self.runner, token)?;
        state.hashed_livepatch_token = Some(hashed);
        state.livepatch_server_url = Some(server.to_owned());
        self.save(state)
    }

    /// Hand Livepatch back to the hosted service and, if the subscription
    /// entitles it, to the Pro client.
    fn reset_livepatch(&self, state: &mut PersistedState) -> Result<(), ReconcileError> {
        tracing::info!("livepatch on-prem configuration removed, restoring defaults");
        let status = pro_client::status(&self.runner)?;
        livepatch::set_server(&self.runner, livepatch::DEFAULT_LIVEPATCH_SERVER)?;
        livepatch::disable(&self.runner)?;
        if status.attached && status.is_enabled("livepatch") {
            pro_client::enable_service(&self.runner, "livepatch")?;
        }
        state.hashed_livepatch_token = None;
        state.livepatch_server_url = None;
        self.save(state)
    }

    // -----------------------------------------------------------------------
    // 4. Subscription
    // -----------------------------------------------------------------------

    fn handle_subscription(
        &self,
        config: &DesiredConfig,
        proxy: &ProxyEnv,
        state: &mut PersistedState,
    ) -> Result<Flow, ReconcileError> {
        match self.sync_subscription(config, proxy, state) {
            Ok(Some(status)) => Ok(Flow::Halt(status)),
            other => Ok(contain(other.map(|_| ()), "Error configuring Ubuntu Pro")),
        }
    }

    /// `Ok(Some(_))` is a blocked status the caller should publish as is.
    fn sync_subscription(
        &self,
        config: &DesiredConfig,
        proxy: &ProxyEnv,
        state: &mut PersistedState,
    ) -> Result<Option<UnitStatus>, ReconcileError> {
        let token = config.token();
        let hashed_token = token.map(hash_secret);
        let token_changed = hashed_token != state.hashed_token;
        let config_changed = config.contract_url() != state.contract_url.as_deref()
            || config.security_url() != state.security_url.as_deref();

        for (key, value) in pro_client::PROXY_KEYS.into_iter().zip([
            proxy.http_proxy.as_deref(),
            proxy.https_proxy.as_deref(),
        ]) {
            pro_client::set_config(&self.runner, key, value)?;
        }

        // Detach and clear the hash before recording new URLs: if the detach
        // fails, the next pass still sees the URL change and retries it.
        let needs_attach = token_changed || config_changed;
        if needs_attach {
            let status = pro_client::status(&self.runner)?;
            if status.attached {
                pro_client::detach(&self.runner)?;
            }
            if state.hashed_token.take().is_some() {
                self.save(state)?;
            }
        }

        if config_changed {
            tracing::info!(contract_url = ?config.contract_url(), "updating client configuration");
            client_config::update_at(
                &self.client_config,
                config.contract_url(),
                config.security_url(),
            )?;
            state.contract_url = config.contract_url().map(str::to_owned);
            state.security_url = config.security_url().map(str::to_owned);
            self.save(state)?;
        }

        let Some(token) = token else {
            return Ok(Some(UnitStatus::blocked(NO_TOKEN_MESSAGE)));
        };

        if needs_attach {
            let services = config.service_list();
            if let Err(err) =
                pro_client::attach(&self.runner, token, services.as_deref(), &self.retry)
            {
                tracing::error!(error = %err, "attach failed");
                return Ok(Some(UnitStatus::blocked(format!(
                    "Error attaching: {}",
                    err.detail()
                ))));
            }
            state.hashed_token = hashed_token;
            self.save(state)?;
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // 5. Status
    // -----------------------------------------------------------------------

    fn handle_status(&self) -> Result<UnitStatus, ReconcileError> {
        let status = pro_client::status(&self.runner)?;
        let services = status.enabled_services().join(",");
        Ok(UnitStatus::active(format!("Attached ({services})")))
    }
}

/// Turn a failed contained step into a blocked status.
fn contain(result: Result<(), ReconcileError>, context: &str) -> Flow {
    match result {
        Ok(()) => Flow::Continue,
        Err(err) => {
            tracing::error!(error = %err, "{context}");
            let detail = match &err {
                ReconcileError::Host(host) => host.detail(),
                other => other.to_string(),
            };
            Flow::Halt(UnitStatus::blocked(format!("{context}: {detail}")))
        }
    }
}

fn redact_status(status: UnitStatus, secrets: &[&str]) -> UnitStatus {
    let message = redact(status.message(), secrets);
    match status {
        UnitStatus::Maintenance(_) => UnitStatus::Maintenance(message),
        UnitStatus::Blocked(_) => UnitStatus::Blocked(message),
        UnitStatus::Active(_) => UnitStatus::Active(message),
    }
}

/// Replace every occurrence of each secret with `***`.
pub fn redact(message: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(message.to_owned(), |msg, secret| msg.replace(secret, "***"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pro_charm_host::HostError;

    #[test]
    fn redact_replaces_all_secrets() {
        assert_eq!(
            redact("token new-token-2 rejected (new-token-2)", &["new-token-2", ""]),
            "token *** rejected (***)"
        );
    }

    #[test]
    fn contain_uses_command_stderr() {
        let err = HostError::CommandFailed {
            command: "canonical-livepatch enable ***".into(),
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "invalid token\n".into(),
        };
        assert_eq!(
            contain(Err(err.into()), "Error configuring livepatch"),
            Flow::Halt(UnitStatus::blocked("Error configuring livepatch: invalid token"))
        );
    }
}
