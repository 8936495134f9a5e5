// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::bail;
use async_trait::async_trait;
use deployer_planner::FacetCut;
use ethers::types::{Address, Bytes};

use crate::Deployer;

#[derive(Default)]
pub struct State {
    pub deployed: Vec<(String, Vec<u8>)>,
    pub cuts: Vec<(Address, Vec<FacetCut>)>,
    pub owners: HashMap<Address, Address>,
    pub transfers: Vec<(Address, Address)>,
}

/// Assigns sequential addresses and records every call.
#[derive(Default)]
pub struct MockDeployer {
    pub fail_cut: bool,
    /// Accept ownership transfers without changing the owner.
    pub ignore_transfer: bool,
    pub state: Mutex<State>,
}

impl MockDeployer {
    pub fn with_owner(contract: Address, owner: Address) -> Self {
        let deployer = Self::default();
        deployer
            .state
            .lock()
            .unwrap()
            .owners
            .insert(contract, owner);
        deployer
    }
}

#[async_trait]
impl Deployer for MockDeployer {
    async fn deploy(&self, name: &str, code: Vec<u8>) -> anyhow::Result<Address> {
        let mut state = self.state.lock().unwrap();
        state.deployed.push((name.to_owned(), code));
        Ok(Address::from_low_u64_be(state.deployed.len() as u64))
    }

    async fn diamond_cut(
        &self,
        diamond: Address,
        cuts: Vec<FacetCut>,
        init: Address,
        calldata: Bytes,
    ) -> anyhow::Result<()> {
        assert_eq!(init, Address::zero());
        assert!(calldata.is_empty());
        if self.fail_cut {
            bail!("execution reverted");
        }
        self.state.lock().unwrap().cuts.push((diamond, cuts));
        Ok(())
    }

    async fn owner(&self, contract: Address) -> anyhow::Result<Address> {
        let state = self.state.lock().unwrap();
        Ok(state.owners.get(&contract).copied().unwrap_or_default())
    }

    async fn transfer_ownership(&self, contract: Address, new_owner: Address) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.transfers.push((contract, new_owner));
        if !self.ignore_transfer {
            state.owners.insert(contract, new_owner);
        }
        Ok(())
    }
}
