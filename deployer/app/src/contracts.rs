// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Bindings for the standard interfaces the deployer talks to after contracts are created.

use ethers::contract::abigen;

// EIP-2535 `IDiamondCut`. The full JSON form is needed so the cut tuple gets a named struct.
abigen!(
    IDiamondCut,
    r#"[
        {
            "type": "function",
            "name": "diamondCut",
            "inputs": [
                {
                    "name": "_diamondCut",
                    "type": "tuple[]",
                    "internalType": "struct IDiamondCut.FacetCut[]",
                    "components": [
                        { "name": "facetAddress", "type": "address", "internalType": "address" },
                        { "name": "action", "type": "uint8", "internalType": "enum IDiamondCut.FacetCutAction" },
                        { "name": "functionSelectors", "type": "bytes4[]", "internalType": "bytes4[]" }
                    ]
                },
                { "name": "_init", "type": "address", "internalType": "address" },
                { "name": "_calldata", "type": "bytes", "internalType": "bytes" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        }
    ]"#
);

// ERC-173 contract ownership.
abigen!(
    IERC173,
    r#"[
        function owner() external view returns (address)
        function transferOwnership(address newOwner) external
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner)
    ]"#
);

impl From<deployer_planner::FacetCut> for FacetCut {
    fn from(value: deployer_planner::FacetCut) -> Self {
        Self {
            facet_address: value.target,
            action: value.action.into(),
            function_selectors: value.selectors.into_iter().map(|s| s.into()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use deployer_planner::{FacetCutAction, Selector};
    use ethers::contract::EthCall;
    use ethers::types::Address;

    use super::{DiamondCutCall, FacetCut, OwnerCall, TransferOwnershipCall};

    #[test]
    fn standard_selectors() {
        assert_eq!(DiamondCutCall::selector(), [0x1f, 0x93, 0x1c, 0x1c]);
        assert_eq!(OwnerCall::selector(), [0x8d, 0xa5, 0xcb, 0x5b]);
        assert_eq!(TransferOwnershipCall::selector(), [0xf2, 0xfd, 0xe3, 0x8b]);
    }

    #[test]
    fn convert_planned_cut() {
        let planned = deployer_planner::FacetCut {
            target: Address::from_low_u64_be(3),
            action: FacetCutAction::Add,
            selectors: vec![Selector::from_signature("owner()")],
        };

        let cut = FacetCut::from(planned);

        assert_eq!(cut.facet_address, Address::from_low_u64_be(3));
        assert_eq!(cut.action, 0);
        assert_eq!(cut.function_selectors, vec![[0x8d, 0xa5, 0xcb, 0x5b]]);
    }
}
