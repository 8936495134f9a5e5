// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use deployer_app_options::config::ConfigArgs;

use crate::{cmd, settings::Settings};

cmd! {
  ConfigArgs(self, settings) {
    print_settings(settings)
  }
}

fn print_settings(settings: Settings) -> anyhow::Result<()> {
    // The private key is redacted by its `Debug` implementation.
    println!("{settings:#?}");
    Ok(())
}
