//! `ubuntu-pro-charm state`: inspect the persisted reconciliation state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use pro_charm_core::PersistedState;

use crate::Paths;

/// Arguments for `ubuntu-pro-charm state`.
#[derive(Args, Debug)]
pub struct StateArgs {
    /// Emit the raw state file contents as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StateArgs {
    pub fn run(self, paths: &Paths) -> Result<()> {
        let store = paths.store();
        let state = store
            .load()
            .with_context(|| format!("failed to load {}", store.path().display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&state).context("failed to serialize state JSON")?
            );
            return Ok(());
        }

        println!("State file: {}", store.path().display());
        let mut table = Table::new(rows(&state, Utc::now()));
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "field")]
    field: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

fn rows(state: &PersistedState, now: DateTime<Utc>) -> Vec<StateRow> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    // Digests are shortened; they only need to show whether a token is recorded.
    let digest = |v: &Option<String>| {
        v.as_deref()
            .map(|h| format!("{}…", h.chars().take(12).collect::<String>()))
            .unwrap_or_else(|| "-".to_string())
    };

    vec![
        StateRow { field: "ppa", value: opt(&state.ppa) },
        StateRow {
            field: "package needs installing",
            value: state.package_needs_installing.to_string(),
        },
        StateRow { field: "token", value: digest(&state.hashed_token) },
        StateRow { field: "contract url", value: opt(&state.contract_url) },
        StateRow { field: "security url", value: opt(&state.security_url) },
        StateRow {
            field: "livepatch installed",
            value: state.livepatch_installed.to_string(),
        },
        StateRow {
            field: "livepatch token",
            value: digest(&state.hashed_livepatch_token),
        },
        StateRow {
            field: "livepatch server",
            value: opt(&state.livepatch_server_url),
        },
        StateRow {
            field: "updated",
            value: state
                .updated_at
                .map(|t| format_age(now - t))
                .unwrap_or_else(|| "never".to_string()),
        },
    ]
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_are_shortened() {
        let state = PersistedState {
            hashed_token: Some("4c5dc9b7708905f77f5e5d16316b5dfb".into()),
            ..Default::default()
        };
        let rows = rows(&state, Utc::now());
        let token = rows.iter().find(|r| r.field == "token").unwrap();
        assert_eq!(token.value, "4c5dc9b77089…");
    }

    #[test]
    fn hand_edited_non_ascii_digest_is_shortened_by_char() {
        let state = PersistedState {
            hashed_livepatch_token: Some("ééééééééééééééé".into()),
            ..Default::default()
        };
        let rows = rows(&state, Utc::now());
        let token = rows.iter().find(|r| r.field == "livepatch token").unwrap();
        assert_eq!(token.value, "éééééééééééé…");
    }

    #[test]
    fn never_updated_state() {
        let rows = rows(&PersistedState::default(), Utc::now());
        assert_eq!(rows.last().unwrap().value, "never");
    }

    #[test]
    fn ages() {
        assert_eq!(format_age(chrono::Duration::seconds(5)), "5s ago");
        assert_eq!(format_age(chrono::Duration::seconds(125)), "2m ago");
        assert_eq!(format_age(chrono::Duration::hours(3)), "3h ago");
        assert_eq!(format_age(chrono::Duration::days(2)), "2d ago");
    }
}
