// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use ethers_core::types::Address;
use quickcheck::{Arbitrary, Gen};

use crate::{ExclusionSet, FacetDescriptor, Selector};

/// A small pool of signatures, so that facets generated together overlap often.
const SIGNATURES: [&str; 10] = [
    "init(bytes)",
    "owner()",
    "transferOwnership(address)",
    "supportsInterface(bytes4)",
    "balanceOf(address)",
    "transfer(address,uint256)",
    "deposit(uint256)",
    "withdraw(uint256,address)",
    "totalSupply()",
    "pause()",
];

fn arb_signature(g: &mut Gen) -> String {
    g.choose(&SIGNATURES).unwrap().to_string()
}

impl Arbitrary for FacetDescriptor {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % 6;
        let id = u64::arbitrary(g);
        FacetDescriptor {
            name: format!("Facet{id}"),
            address: Address::from_low_u64_be(id),
            signatures: (0..n).map(|_| arb_signature(g)).collect(),
        }
    }
}

/// A non-empty list of facets with distinct addresses, in deployment order.
#[derive(Clone, Debug)]
pub struct ArbFacets(pub Vec<FacetDescriptor>);

impl Arbitrary for ArbFacets {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % 5 + 1;
        let facets = (0..n)
            .map(|i| {
                let mut f = FacetDescriptor::arbitrary(g);
                f.name = format!("Facet{i}");
                f.address = Address::from_low_u64_be(i as u64 + 1);
                f
            })
            .collect();
        Self(facets)
    }
}

#[derive(Clone, Debug)]
pub struct ArbExclusions(pub ExclusionSet);

impl Arbitrary for ArbExclusions {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % 3;
        Self(
            (0..n)
                .map(|_| Selector::from_signature(&arb_signature(g)))
                .collect(),
        )
    }
}
