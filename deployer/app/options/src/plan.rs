// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Manifest to plan, either a path or a name in the manifests directory.
    #[arg(long, short)]
    pub manifest: PathBuf,

    /// Address book of an earlier deployment to take the facet addresses from;
    /// without it every facet is planned at the zero address.
    #[arg(long, short)]
    pub addresses: Option<PathBuf>,
}
