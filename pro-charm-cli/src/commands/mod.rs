pub mod hook;
pub mod reconcile;
pub mod state;
pub mod status;

use colored::Colorize;
use pro_charm_core::UnitStatus;

/// `state: message`, coloured by workload state.
pub(crate) fn render_status(status: &UnitStatus) -> String {
    let state = match status {
        UnitStatus::Active(_) => status.state_name().green().bold(),
        UnitStatus::Blocked(_) => status.state_name().red().bold(),
        UnitStatus::Maintenance(_) => status.state_name().yellow().bold(),
    };
    format!("{state}: {}", status.message())
}
