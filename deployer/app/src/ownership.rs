// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! ERC-173 ownership of deployed contracts.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use deployer_app_options::parse::ContractRef;
use deployer_planner::AddressBook;
use ethers::types::Address;

use crate::store::read_json;
use crate::Deployer;

/// Find the address of a contract given by name in an address book.
///
/// Without an explicit book every address book in `network_dir` is searched, in file name order.
pub fn resolve_contract(
    contract: &ContractRef,
    addresses: Option<&Path>,
    network_dir: &Path,
) -> anyhow::Result<Address> {
    let name = match contract {
        ContractRef::Address(a) => return Ok(*a),
        ContractRef::Name(n) => n,
    };

    let (books, searched) = match addresses {
        Some(path) => (vec![read_json::<AddressBook>(path)?], path),
        None => (network_address_books(network_dir)?, network_dir),
    };

    books
        .iter()
        .find_map(|b| b.get(name).copied())
        .ok_or_else(|| anyhow!("{name} is not in any address book in {searched:?}"))
}

/// Read every `.json` address book in a directory; a missing directory has none.
pub fn network_address_books(dir: &Path) -> anyhow::Result<Vec<AddressBook>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {dir:?}"))?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;

    paths.retain(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"));
    paths.sort();

    paths.iter().map(|p| read_json(p)).collect()
}

/// Transfer the ownership of a contract and check that it took effect.
///
/// Returns the owner, which is `new_owner` unless the call failed.
pub async fn transfer_ownership<D: Deployer>(
    deployer: &D,
    contract: Address,
    new_owner: Address,
) -> anyhow::Result<Address> {
    let current = deployer.owner(contract).await?;

    if current == new_owner {
        tracing::info!(?contract, owner = ?current, "already the owner");
        return Ok(current);
    }

    deployer.transfer_ownership(contract, new_owner).await?;

    let owner = deployer.owner(contract).await?;

    if owner != new_owner {
        bail!("the owner of {contract:?} is {owner:?} after the transfer");
    }

    Ok(owner)
}
