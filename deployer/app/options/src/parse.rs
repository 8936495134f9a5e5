// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt::Display;
use std::str::FromStr;

use ethers_core::types::Address;

/// Refer to a deployed contract either by address or by its name in an address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractRef {
    Address(Address),
    Name(String),
}

impl Display for ContractRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractRef::Address(a) => write!(f, "{a:?}"),
            ContractRef::Name(n) => write!(f, "{n}"),
        }
    }
}

pub fn parse_eth_address(s: &str) -> Result<Address, String> {
    if !s.starts_with("0x") {
        return Err(format!("expected a 0x prefixed address: {s}"));
    }
    Address::from_str(s).map_err(|e| format!("error parsing address: {e}"))
}

pub fn parse_contract_ref(s: &str) -> Result<ContractRef, String> {
    if s.starts_with("0x") {
        parse_eth_address(s).map(ContractRef::Address)
    } else if s.is_empty() {
        Err("contract name cannot be empty".to_owned())
    } else {
        Ok(ContractRef::Name(s.to_owned()))
    }
}
