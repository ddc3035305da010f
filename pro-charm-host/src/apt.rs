//! PPA and package management through `add-apt-repository` and `apt-get`.

use crate::error::HostError;
use crate::proxy::ProxyEnv;
use crate::runner::{CommandRunner, CommandSpec};

/// The package that provides the Pro client.
pub const PRO_CLIENT_PACKAGE: &str = "ubuntu-advantage-tools";

pub fn add_repository(
    runner: &impl CommandRunner,
    ppa: &str,
    proxy: &ProxyEnv,
) -> Result<(), HostError> {
    tracing::info!(ppa, "adding repository");
    let cmd = CommandSpec::new("add-apt-repository")
        .args(["--yes", ppa])
        .envs(proxy.vars());
    runner.check(&cmd)?;
    Ok(())
}

pub fn remove_repository(
    runner: &impl CommandRunner,
    ppa: &str,
    proxy: &ProxyEnv,
) -> Result<(), HostError> {
    tracing::info!(ppa, "removing repository");
    let cmd = CommandSpec::new("add-apt-repository")
        .args(["--remove", "--yes", ppa])
        .envs(proxy.vars());
    runner.check(&cmd)?;
    Ok(())
}

/// Refresh the package index, then install `package`.
pub fn install_package(
    runner: &impl CommandRunner,
    package: &str,
    proxy: &ProxyEnv,
) -> Result<(), HostError> {
    tracing::info!(package, "installing package");
    runner.check(&CommandSpec::new("apt-get").arg("update").envs(proxy.vars()))?;
    runner.check(
        &CommandSpec::new("apt-get")
            .args(["install", "--yes", "--quiet", package])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .envs(proxy.vars()),
    )?;
    Ok(())
}
