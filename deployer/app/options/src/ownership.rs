// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use clap::{Args, Subcommand};
use ethers_core::types::Address;

use crate::parse::{parse_contract_ref, parse_eth_address, ContractRef};

#[derive(Args, Debug)]
pub struct OwnershipArgs {
    #[command(subcommand)]
    pub command: OwnershipCommands,
}

#[derive(Subcommand, Debug)]
pub enum OwnershipCommands {
    /// Print the current owner of a contract.
    Show(OwnershipShowArgs),
    /// Transfer the ownership of a contract to a new owner.
    Transfer(OwnershipTransferArgs),
}

#[derive(Args, Debug)]
pub struct OwnershipShowArgs {
    /// Address of the contract, or its name in the address book.
    #[arg(long, short, value_parser = parse_contract_ref)]
    pub contract: ContractRef,

    /// Address book to look up contract names in.
    #[arg(long, short)]
    pub addresses: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OwnershipTransferArgs {
    /// Address of the contract, or its name in the address book.
    #[arg(long, short, value_parser = parse_contract_ref)]
    pub contract: ContractRef,

    /// Address of the new owner.
    #[arg(long, short, value_parser = parse_eth_address)]
    pub new_owner: Address,

    /// Address book to look up contract names in.
    #[arg(long, short)]
    pub addresses: Option<PathBuf>,
}
