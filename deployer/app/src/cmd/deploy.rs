// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use deployer_app::{deploy_manifest, EthDeployer};
use deployer_app_options::deploy::DeployArgs;
use deployer_hardhat::Hardhat;

use crate::{cmd, settings::Settings};

cmd! {
  DeployArgs(self, settings) {
    deploy(settings, self).await
  }
}

async fn deploy(settings: Settings, args: &DeployArgs) -> anyhow::Result<()> {
    let manifest = super::manifest(&settings, &args.manifest)?;
    let hardhat = Hardhat::new(settings.artifacts_dir());
    let deployer = EthDeployer::new(&settings.network).await?;

    let output = match args.output {
        Some(ref path) => path.clone(),
        None => settings.address_book_path(&manifest.name),
    };

    let book = deploy_manifest(&hardhat, &deployer, &manifest, &output).await?;

    println!("{}", serde_json::to_string_pretty(&book)?);

    Ok(())
}
