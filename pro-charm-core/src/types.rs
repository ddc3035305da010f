//! Domain types for the Ubuntu Pro charm.
//!
//! [`DesiredConfig`] is what the operator declared, re-read on every hook.
//! [`PersistedState`] is what this unit last achieved, carried across hooks.
//! [`ServiceStatus`] is what the Pro client reports right now.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The public contracts server used when no `contract_url` is declared.
pub const DEFAULT_CONTRACT_URL: &str = "https://contracts.canonical.com";

// ---------------------------------------------------------------------------
// Declared configuration
// ---------------------------------------------------------------------------

/// Operator-declared charm configuration.
///
/// Field names follow the charm's `config.yaml` keys, so the JSON printed by
/// `config-get --format=json` and a hand-written YAML file both deserialize
/// directly. Use the accessor methods rather than the raw fields: they strip
/// whitespace and treat empty strings as unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredConfig {
    pub ppa: Option<String>,
    pub token: Option<String>,
    pub contract_url: Option<String>,
    pub services: Option<String>,
    pub livepatch_server_url: Option<String>,
    pub livepatch_token: Option<String>,
    #[serde(rename = "override-http-proxy")]
    pub override_http_proxy: Option<String>,
    #[serde(rename = "override-https-proxy")]
    pub override_https_proxy: Option<String>,
    #[serde(rename = "override-ssl-cert-file")]
    pub override_ssl_cert_file: Option<String>,
    pub security_url: Option<String>,
}

fn stripped(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DesiredConfig {
    pub fn ppa(&self) -> Option<&str> {
        stripped(&self.ppa)
    }

    pub fn token(&self) -> Option<&str> {
        stripped(&self.token)
    }

    /// Declared contract URL, or `None` when the default should apply.
    pub fn contract_url(&self) -> Option<&str> {
        stripped(&self.contract_url)
    }

    pub fn security_url(&self) -> Option<&str> {
        stripped(&self.security_url)
    }

    pub fn livepatch_server_url(&self) -> Option<&str> {
        stripped(&self.livepatch_server_url)
    }

    pub fn livepatch_token(&self) -> Option<&str> {
        stripped(&self.livepatch_token)
    }

    pub fn override_http_proxy(&self) -> Option<&str> {
        stripped(&self.override_http_proxy)
    }

    pub fn override_https_proxy(&self) -> Option<&str> {
        stripped(&self.override_https_proxy)
    }

    pub fn override_ssl_cert_file(&self) -> Option<&str> {
        stripped(&self.override_ssl_cert_file)
    }

    /// Comma-separated `services` as a list, or `None` when no subset is declared.
    ///
    /// Empty entries are dropped, so `"esm-infra,,cis "` yields `["esm-infra", "cis"]`
    /// and `" , "` yields `None`.
    pub fn service_list(&self) -> Option<Vec<String>> {
        let services: Vec<String> = stripped(&self.services)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if services.is_empty() {
            None
        } else {
            Some(services)
        }
    }

    /// Secrets that must never appear in a published status message.
    pub fn secrets(&self) -> Vec<&str> {
        self.token().into_iter().chain(self.livepatch_token()).collect()
    }
}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// State carried across hook invocations.
///
/// Only ever updated after the external action it records has succeeded.
/// Tokens are stored as SHA-256 hex digests, never in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub ppa: Option<String>,
    #[serde(default)]
    pub hashed_token: Option<String>,
    #[serde(default = "default_true")]
    pub package_needs_installing: bool,
    #[serde(default)]
    pub contract_url: Option<String>,
    #[serde(default)]
    pub security_url: Option<String>,
    #[serde(default)]
    pub livepatch_installed: bool,
    #[serde(default)]
    pub hashed_livepatch_token: Option<String>,
    #[serde(default)]
    pub livepatch_server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            ppa: None,
            hashed_token: None,
            package_needs_installing: true,
            contract_url: None,
            security_url: None,
            livepatch_installed: false,
            hashed_livepatch_token: None,
            livepatch_server_url: None,
            updated_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Live service status
// ---------------------------------------------------------------------------

/// One entry of the `services` array in `ubuntu-advantage status --format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    /// Absent for detached machines, which only report availability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ServiceEntry {
    /// `enabled` and `warning` both mean the service is running for this host.
    pub fn is_enabled(&self) -> bool {
        matches!(self.status.as_deref(), Some("enabled") | Some("warning"))
    }
}

/// Attachment and per-service state reported by the Pro client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub attached: bool,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

impl ServiceStatus {
    /// Names of enabled services, in the order the client reported them.
    pub fn enabled_services(&self) -> Vec<&str> {
        self.services
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.services.iter().any(|s| s.name == name && s.is_enabled())
    }
}

// ---------------------------------------------------------------------------
// Unit status
// ---------------------------------------------------------------------------

/// The externally visible unit status published to Juju.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    Maintenance(String),
    Blocked(String),
    Active(String),
}

impl UnitStatus {
    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::Maintenance(message.into())
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::Blocked(message.into())
    }

    pub fn active(message: impl Into<String>) -> Self {
        Self::Active(message.into())
    }

    /// Workload state name as accepted by `status-set`.
    pub fn state_name(&self) -> &'static str {
        match self {
            UnitStatus::Maintenance(_) => "maintenance",
            UnitStatus::Blocked(_) => "blocked",
            UnitStatus::Active(_) => "active",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Maintenance(m) | UnitStatus::Blocked(m) | UnitStatus::Active(m) => m,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, UnitStatus::Blocked(_))
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.state_name(), self.message())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
