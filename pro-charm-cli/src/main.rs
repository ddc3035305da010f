//! ubuntu-pro-charm: keeps a machine's Ubuntu Pro subscription in line with
//! its Juju charm configuration.
//!
//! # Usage
//!
//! ```text
//! ubuntu-pro-charm dispatch
//! ubuntu-pro-charm hook <name>
//! ubuntu-pro-charm reconcile --config <file>
//! ubuntu-pro-charm status [--json]
//! ubuntu-pro-charm state [--json]
//! ```
//!
//! Logs go to stderr so the Juju agent captures them alongside hook output.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use commands::{
    hook::{DispatchArgs, HookArgs},
    reconcile::ReconcileArgs,
    state::StateArgs,
    status::StatusArgs,
};
use pro_charm_core::{client_config::UACLIENT_CONFIG, state::StateStore};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ubuntu-pro-charm",
    version,
    about = "Reconcile Ubuntu Pro attachment, PPA and Livepatch with charm configuration",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    paths: Paths,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the handler for the hook named by JUJU_DISPATCH_PATH.
    Dispatch(DispatchArgs),

    /// Run the handler for a named hook.
    Hook(HookArgs),

    /// Reconcile once against a local YAML configuration file.
    Reconcile(ReconcileArgs),

    /// Show attachment and service status reported by the Pro client.
    Status(StatusArgs),

    /// Show the state persisted by the last reconciliation.
    State(StateArgs),
}

/// Filesystem locations shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Paths {
    /// Directory holding the persisted state file.
    #[arg(long, global = true, env = "JUJU_CHARM_DIR", default_value = ".")]
    pub state_dir: PathBuf,

    /// Pro client configuration file to patch.
    #[arg(long, global = true, default_value = UACLIENT_CONFIG)]
    pub client_config: PathBuf,
}

impl Paths {
    pub fn store(&self) -> StateStore {
        StateStore::new(self.state_dir.clone())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Dispatch(args) => args.run(&cli.paths),
        Commands::Hook(args) => args.run(&cli.paths),
        Commands::Reconcile(args) => args.run(&cli.paths),
        Commands::Status(args) => args.run(),
        Commands::State(args) => args.run(&cli.paths),
    }
}
