// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use deployer_app::ownership::{resolve_contract, transfer_ownership};
use deployer_app::{Deployer, EthDeployer};
use deployer_app_options::ownership::{
    OwnershipArgs, OwnershipCommands, OwnershipShowArgs, OwnershipTransferArgs,
};

use crate::cmd::Cmd;
use crate::{cmd, settings::Settings};

cmd! {
  OwnershipArgs(self, settings) {
    match &self.command {
      OwnershipCommands::Show(args) => args.exec(settings).await,
      OwnershipCommands::Transfer(args) => args.exec(settings).await,
    }
  }
}

cmd! {
  OwnershipShowArgs(self, settings) {
    let contract = resolve_contract(&self.contract, self.addresses.as_deref(), &network_dir(&settings))?;
    let deployer = EthDeployer::new(&settings.network).await?;
    let owner = deployer.owner(contract).await?;
    println!("{owner:?}");
    Ok(())
  }
}

cmd! {
  OwnershipTransferArgs(self, settings) {
    let contract = resolve_contract(&self.contract, self.addresses.as_deref(), &network_dir(&settings))?;
    let deployer = EthDeployer::new(&settings.network).await?;
    let owner = transfer_ownership(&deployer, contract, self.new_owner).await?;
    println!("{owner:?}");
    Ok(())
  }
}

/// Where the address books of the configured network are saved.
fn network_dir(settings: &Settings) -> std::path::PathBuf {
    settings.output_dir().join(&settings.network.name)
}
