// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;

use deployer_app::diamond::{log_skipped, plan_diamond};
use deployer_app::store::read_json;
use deployer_app_options::plan::PlanArgs;
use deployer_hardhat::Hardhat;
use deployer_planner::{AddressBook, CutPlan};

use crate::{cmd, settings::Settings};

cmd! {
  PlanArgs(self, settings) {
    plan(settings, self)
  }
}

/// Print the cuts of every diamond in the manifest as JSON, without touching the chain.
fn plan(settings: Settings, args: &PlanArgs) -> anyhow::Result<()> {
    let manifest = super::manifest(&settings, &args.manifest)?;
    let hardhat = Hardhat::new(settings.artifacts_dir());

    let addresses = match args.addresses {
        Some(ref path) => read_json::<AddressBook>(path)?,
        None => AddressBook::new(),
    };

    let mut plans: BTreeMap<&str, CutPlan> = BTreeMap::new();

    for d in manifest.diamonds.iter() {
        let plan = plan_diamond(&hardhat, d, &addresses)?;
        log_skipped(&d.name, &plan);
        plans.insert(&d.name, plan);
    }

    println!("{}", serde_json::to_string_pretty(&plans)?);

    Ok(())
}
