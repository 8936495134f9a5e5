// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
pub mod contracts;
pub mod deployer;
pub mod diamond;
pub mod manifest;
pub mod ownership;
pub mod store;

#[cfg(test)]
mod testing;

pub use deployer::{Deployer, EthDeployer};
pub use diamond::{deploy_manifest, DeploymentRun};
pub use manifest::Manifest;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
pub enum AppExitCode {
    /// Exited normally
    Ok = 0,
    /// Exited with an unknown error
    UnknownError = 1,
}
