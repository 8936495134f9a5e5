// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use deployer_app_settings::NetworkSettings;
use ethers::prelude::k256::ecdsa::SigningKey;
use ethers::prelude::{Signer, SignerMiddleware};
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Wallet};
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, U64};

use crate::contracts::{IDiamondCut, IERC173};

pub type DefaultSignerMiddleware = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

/// Everything a deployment run needs from the chain.
///
/// Every method waits for the transaction to be included before it returns,
/// so calls on the same instance are applied in order.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Create a contract from its deployment code, that is the linked bytecode
    /// followed by the ABI encoded constructor arguments.
    async fn deploy(&self, name: &str, code: Vec<u8>) -> anyhow::Result<Address>;

    /// Submit a single `diamondCut` transaction.
    async fn diamond_cut(
        &self,
        diamond: Address,
        cuts: Vec<deployer_planner::FacetCut>,
        init: Address,
        calldata: Bytes,
    ) -> anyhow::Result<()>;

    async fn owner(&self, contract: Address) -> anyhow::Result<Address>;

    async fn transfer_ownership(&self, contract: Address, new_owner: Address)
        -> anyhow::Result<()>;
}

/// Sends signed transactions to a JSON-RPC node.
pub struct EthDeployer {
    signer: Arc<DefaultSignerMiddleware>,
    receipt_retries: usize,
    confirmations: usize,
}

impl EthDeployer {
    /// Connect to the configured node and check that it serves the expected chain.
    pub async fn new(network: &NetworkSettings) -> anyhow::Result<Self> {
        let private_key = network.private_key.as_ref().ok_or_else(|| {
            anyhow!("a private key is needed to send transactions on {}", network.name)
        })?;

        let provider = Provider::<Http>::try_from(network.rpc_url.as_str())
            .context("failed to create HTTP provider")?
            .interval(network.polling_interval);

        let chain_id = provider
            .get_chainid()
            .await
            .with_context(|| format!("failed to get the chain ID from {}", network.rpc_url))?
            .as_u64();

        if let Some(expected) = network.chain_id {
            if expected != chain_id {
                bail!("expected chain ID {expected} but the node is on {chain_id}");
            }
        }

        let wallet = LocalWallet::from_str(private_key.expose())
            .context("failed to parse private key")?
            .with_chain_id(chain_id);

        tracing::info!(
            network = network.name,
            chain_id,
            sender = ?wallet.address(),
            "connected to network"
        );

        Ok(Self {
            signer: Arc::new(SignerMiddleware::new(provider, wallet)),
            receipt_retries: network.receipt_retries,
            confirmations: network.confirmations,
        })
    }

    /// Wait for the receipt of a transaction and check that it succeeded.
    async fn receipt(
        &self,
        what: &str,
        pending_tx: PendingTransaction<'_, Http>,
    ) -> anyhow::Result<TransactionReceipt> {
        let tx_hash = pending_tx.tx_hash();

        tracing::debug!(what, ?tx_hash, "waiting for receipt");

        let receipt = pending_tx
            .confirmations(self.confirmations)
            .retries(self.receipt_retries)
            .await
            .with_context(|| format!("failed to get the receipt of {what}"))?
            .ok_or_else(|| {
                anyhow!(
                    "no receipt for {what} after {} retries: {tx_hash:?}",
                    self.receipt_retries
                )
            })?;

        if receipt.status != Some(U64::one()) {
            bail!("{what} failed: {tx_hash:?}");
        }

        Ok(receipt)
    }
}

#[async_trait]
impl Deployer for EthDeployer {
    async fn deploy(&self, name: &str, code: Vec<u8>) -> anyhow::Result<Address> {
        // No recipient means contract creation.
        let tx = TransactionRequest::new().data(code);

        let pending_tx = self
            .signer
            .send_transaction(tx, None)
            .await
            .with_context(|| format!("failed to send the deployment of {name}"))?;

        let receipt = self.receipt(name, pending_tx).await?;

        let address = receipt
            .contract_address
            .ok_or_else(|| anyhow!("the receipt of {name} has no contract address"))?;

        tracing::info!(
            name,
            ?address,
            tx_hash = ?receipt.transaction_hash,
            gas_used = ?receipt.gas_used,
            "deployed contract"
        );

        Ok(address)
    }

    async fn diamond_cut(
        &self,
        diamond: Address,
        cuts: Vec<deployer_planner::FacetCut>,
        init: Address,
        calldata: Bytes,
    ) -> anyhow::Result<()> {
        let contract = IDiamondCut::new(diamond, self.signer.clone());
        let cuts = cuts.into_iter().map(Into::into).collect();

        let call = contract.diamond_cut(cuts, init, calldata);
        let pending_tx = call.send().await.context("failed to send diamondCut")?;

        let receipt = self.receipt("diamondCut", pending_tx).await?;

        tracing::info!(
            ?diamond,
            tx_hash = ?receipt.transaction_hash,
            "diamond cut"
        );

        Ok(())
    }

    async fn owner(&self, contract: Address) -> anyhow::Result<Address> {
        IERC173::new(contract, self.signer.clone())
            .owner()
            .call()
            .await
            .with_context(|| format!("failed to query the owner of {contract:?}"))
    }

    async fn transfer_ownership(
        &self,
        contract: Address,
        new_owner: Address,
    ) -> anyhow::Result<()> {
        let ownable = IERC173::new(contract, self.signer.clone());

        let call = ownable.transfer_ownership(new_owner);
        let pending_tx = call
            .send()
            .await
            .context("failed to send transferOwnership")?;

        let receipt = self.receipt("transferOwnership", pending_tx).await?;

        tracing::info!(
            ?contract,
            ?new_owner,
            tx_hash = ?receipt.transaction_hash,
            "transferred ownership"
        );

        Ok(())
    }
}
