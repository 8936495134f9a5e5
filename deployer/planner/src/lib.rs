// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Helper data structures to plan diamond pattern facet cuts.
//!
//! A diamond delegates each function selector to exactly one facet, so when several
//! facets declare the same function, the first one in the deployment order keeps it.

// See https://eips.ethereum.org/EIPS/eip-2535

mod address_book;
mod cut;
mod error;
mod selector;

#[cfg(feature = "arb")]
pub mod arb;

pub use address_book::{assemble_address_book, AddressBook};
pub use cut::{
    plan_cuts, CutPlan, FacetCut, FacetCutAction, FacetCutPlanner, FacetDescriptor, SkipReason,
    SkippedSelector,
};
pub use error::PlanError;
pub use selector::{ExclusionSet, Selector, ERC165_SUPPORTS_INTERFACE, FACET_INITIALIZER};
