// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::{HashMap, HashSet};

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};

use crate::{ExclusionSet, PlanError, Selector};

/// A deployed facet contract and the functions it declares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDescriptor {
    /// Informational name, e.g. the contract name of the facet.
    pub name: String,
    pub address: Address,
    /// Canonical function signatures, e.g. `"balanceOf(address)"`.
    pub signatures: Vec<String>,
}

impl FacetDescriptor {
    pub fn new(name: impl Into<String>, address: Address, signatures: Vec<String>) -> Self {
        Self {
            name: name.into(),
            address,
            signatures,
        }
    }
}

/// The action codes of `IDiamondCut.FacetCutAction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetCutAction {
    Add = 0,
    Replace = 1,
    Remove = 2,
}

impl From<FacetCutAction> for u8 {
    fn from(value: FacetCutAction) -> Self {
        value as u8
    }
}

/// A single entry of the list submitted to `diamondCut`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCut {
    pub target: Address,
    pub action: FacetCutAction,
    /// Unique selectors, in the order the facet declared their signatures.
    pub selectors: Vec<Selector>,
}

/// Why a declared signature didn't make it into the cut of its facet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The selector is in the exclusion set.
    Excluded,
    /// An earlier facet already claimed the selector.
    Shadowed { by: Address },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedSelector {
    pub facet: String,
    pub signature: String,
    pub selector: Selector,
    pub reason: SkipReason,
}

/// The outcome of a planning run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CutPlan {
    pub cuts: Vec<FacetCut>,
    /// Diagnostics only; doesn't include repeats within the same facet.
    pub skipped: Vec<SkippedSelector>,
}

impl CutPlan {
    /// Total number of selectors routed by the cuts.
    pub fn selector_count(&self) -> usize {
        self.cuts.iter().map(|c| c.selectors.len()).sum()
    }
}

/// Turns deployed facets into `Add` cuts with no duplicate or excluded selectors.
///
/// The planner holds no state between runs; every call to [FacetCutPlanner::plan]
/// starts from an empty set of claimed selectors.
#[derive(Clone, Debug, Default)]
pub struct FacetCutPlanner {
    exclusions: ExclusionSet,
}

impl FacetCutPlanner {
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self { exclusions }
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Plan the cuts for facets in deployment order.
    ///
    /// The first facet declaring a signature wins it; facets left with nothing to route are omitted.
    pub fn plan(&self, descriptors: &[FacetDescriptor]) -> Result<CutPlan, PlanError> {
        if descriptors.is_empty() {
            return Err(PlanError::InvalidInput(
                "at least one facet descriptor is required".to_owned(),
            ));
        }

        let mut claimed: HashMap<Selector, Address> = HashMap::new();
        let mut cuts = Vec::new();
        let mut skipped = Vec::new();

        for facet in descriptors {
            let mut seen = HashSet::new();
            let mut selectors = Vec::new();

            for signature in facet.signatures.iter() {
                let selector = Selector::from_signature(signature);

                // Repeats within the same facet are idempotent.
                if !seen.insert(selector) {
                    continue;
                }

                let reason = if self.exclusions.contains(&selector) {
                    SkipReason::Excluded
                } else if let Some(by) = claimed.get(&selector) {
                    SkipReason::Shadowed { by: *by }
                } else {
                    claimed.insert(selector, facet.address);
                    selectors.push(selector);
                    continue;
                };

                skipped.push(SkippedSelector {
                    facet: facet.name.clone(),
                    signature: signature.clone(),
                    selector,
                    reason,
                });
            }

            if !selectors.is_empty() {
                cuts.push(FacetCut {
                    target: facet.address,
                    action: FacetCutAction::Add,
                    selectors,
                });
            }
        }

        Ok(CutPlan { cuts, skipped })
    }
}

/// Plan the cuts of a single run, discarding the diagnostics.
pub fn plan_cuts(
    descriptors: &[FacetDescriptor],
    exclusions: &ExclusionSet,
) -> Result<Vec<FacetCut>, PlanError> {
    FacetCutPlanner::new(exclusions.clone())
        .plan(descriptors)
        .map(|p| p.cuts)
}
