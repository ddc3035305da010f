//! `ubuntu-pro-charm status`: what the Pro client reports right now.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use pro_charm_core::ServiceStatus;
use pro_charm_host::{pro_client, SystemRunner};

/// Arguments for `ubuntu-pro-charm status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let status =
            pro_client::status(&SystemRunner).context("failed to query Ubuntu Pro status")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(&status);
        Ok(())
    }
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "service")]
    name: String,
    #[tabled(rename = "status")]
    status: String,
}

fn print_table(status: &ServiceStatus) {
    let attached = if status.attached {
        "attached".green().bold()
    } else {
        "not attached".red().bold()
    };
    println!(
        "Ubuntu Pro: {attached} | {} of {} services enabled",
        status.enabled_services().len(),
        status.services.len()
    );

    if status.services.is_empty() {
        return;
    }
    let rows: Vec<ServiceRow> = status
        .services
        .iter()
        .map(|s| ServiceRow {
            name: s.name.clone(),
            status: s.status.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
