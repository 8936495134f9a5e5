// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;

use anyhow::bail;
use deployer_app::diamond::cut_diamond;
use deployer_app::store::read_json;
use deployer_app::EthDeployer;
use deployer_app_options::cut::CutArgs;
use deployer_hardhat::Hardhat;
use deployer_planner::{AddressBook, CutPlan};

use crate::{cmd, settings::Settings};

cmd! {
  CutArgs(self, settings) {
    cut(settings, self).await
  }
}

/// Cut the facets recorded in an address book into their diamonds.
async fn cut(settings: Settings, args: &CutArgs) -> anyhow::Result<()> {
    let manifest = super::manifest(&settings, &args.manifest)?;

    let diamonds = manifest
        .diamonds
        .iter()
        .filter(|d| args.diamond.as_ref().map_or(true, |n| *n == d.name))
        .collect::<Vec<_>>();

    if diamonds.is_empty() {
        bail!("no diamond to cut in manifest {}", manifest.name);
    }

    let path = match args.addresses {
        Some(ref path) => path.clone(),
        None => settings.address_book_path(&manifest.name),
    };
    let book = read_json::<AddressBook>(&path)?;

    let hardhat = Hardhat::new(settings.artifacts_dir());
    let deployer = EthDeployer::new(&settings.network).await?;

    let mut plans: BTreeMap<&str, CutPlan> = BTreeMap::new();

    for d in diamonds {
        let plan = cut_diamond(&hardhat, &deployer, d, &book).await?;
        plans.insert(&d.name, plan);
    }

    println!("{}", serde_json::to_string_pretty(&plans)?);

    Ok(())
}
