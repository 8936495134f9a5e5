// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use clap::Args;

#[derive(Args, Debug)]
pub struct ConfigArgs;
