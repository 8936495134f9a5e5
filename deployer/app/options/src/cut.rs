// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct CutArgs {
    /// Manifest the diamonds were deployed from, either a path or a name in the manifests directory.
    #[arg(long, short)]
    pub manifest: PathBuf,

    /// Only cut this diamond; by default every diamond in the manifest is cut.
    #[arg(long)]
    pub diamond: Option<String>,

    /// Address book of the interrupted deployment; defaults to the one written by `deploy`.
    #[arg(long, short)]
    pub addresses: Option<PathBuf>,
}
