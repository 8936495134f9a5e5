// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// The errors of facet cut planning.
#[derive(Error, Debug, Eq, PartialEq, Clone)]
pub enum PlanError {
    /// Nothing to cut; submitting an empty cut list on-chain is never intended.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
