// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Manifest to deploy, either a path or a name in the manifests directory.
    #[arg(long, short)]
    pub manifest: PathBuf,

    /// Where to write the address book; defaults to `<output_dir>/<network>/<manifest>.json`.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}
