// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Deploy the contents of a manifest and cut the facets into their diamonds.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use deployer_hardhat::{contract_src, Hardhat, FQN};
use deployer_planner::{AddressBook, CutPlan, FacetCutPlanner, SkipReason};
use ethers::types::{Address, Bytes};

use crate::manifest::{tokenize_args, DiamondManifest, Manifest};
use crate::store::write_json;
use crate::Deployer;

/// Plan the cuts of a diamond with its facets at the addresses found in the book.
///
/// Facets missing from the book are planned at the zero address, which is how
/// the cuts can be previewed before anything is deployed.
pub fn plan_diamond(
    hardhat: &Hardhat,
    diamond: &DiamondManifest,
    addresses: &AddressBook,
) -> anyhow::Result<CutPlan> {
    let descriptors = diamond
        .facets
        .iter()
        .map(|facet| {
            let address = addresses
                .get(&diamond.facet_key(facet))
                .copied()
                .unwrap_or_default();

            hardhat.facet_descriptor(contract_src(facet), facet, address)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let plan = FacetCutPlanner::new(diamond.exclusions())
        .plan(&descriptors)
        .with_context(|| format!("failed to plan the cuts of {}", diamond.name))?;

    Ok(plan)
}

/// Report the selectors which didn't make it into the cuts.
pub fn log_skipped(diamond: &str, plan: &CutPlan) {
    for s in plan.skipped.iter() {
        match s.reason {
            SkipReason::Excluded => tracing::debug!(
                diamond,
                facet = s.facet,
                signature = s.signature,
                selector = %s.selector,
                "excluded selector"
            ),
            SkipReason::Shadowed { by } => tracing::warn!(
                diamond,
                facet = s.facet,
                signature = s.signature,
                selector = %s.selector,
                ?by,
                "selector already routed to an earlier facet"
            ),
        }
    }
}

/// Plan and submit the cut of a diamond whose facets are all in the address book.
///
/// This is also how an interrupted run is finished: the cut is never retried automatically.
pub async fn cut_diamond<D: Deployer>(
    hardhat: &Hardhat,
    deployer: &D,
    diamond: &DiamondManifest,
    book: &AddressBook,
) -> anyhow::Result<CutPlan> {
    let address = *book
        .get(&diamond.name)
        .ok_or_else(|| anyhow!("{} is not in the address book", diamond.name))?;

    for facet in diamond.facets.iter() {
        if book.get(&diamond.facet_key(facet)).is_none() {
            bail!("facet {facet} of {} is not in the address book", diamond.name);
        }
    }

    let plan = plan_diamond(hardhat, diamond, book)?;

    log_skipped(&diamond.name, &plan);

    deployer
        .diamond_cut(address, plan.cuts.clone(), Address::zero(), Bytes::new())
        .await
        .with_context(|| {
            format!(
                "failed to cut facets into {}; the diamond and its facets are deployed but not routed",
                diamond.name
            )
        })?;

    tracing::info!(
        diamond = diamond.name,
        ?address,
        facets = plan.cuts.len(),
        selectors = plan.selector_count(),
        "cut facets into diamond"
    );

    Ok(plan)
}

/// A single pass over a manifest.
///
/// Transactions are sent one at a time; the first failure ends the run,
/// leaving whatever was deployed so far on chain and in the address book.
pub struct DeploymentRun<'a, D> {
    hardhat: &'a Hardhat,
    deployer: &'a D,
    /// Libraries deployed so far, to link into later contracts.
    libraries: HashMap<FQN, Address>,
    book: AddressBook,
}

impl<'a, D: Deployer> DeploymentRun<'a, D> {
    pub fn new(hardhat: &'a Hardhat, deployer: &'a D) -> Self {
        Self {
            hardhat,
            deployer,
            libraries: Default::default(),
            book: Default::default(),
        }
    }

    /// Everything deployed so far.
    pub fn address_book(&self) -> &AddressBook {
        &self.book
    }

    pub fn into_address_book(self) -> AddressBook {
        self.book
    }

    /// Deploy the libraries, then the plain contracts, then the diamonds, in manifest order.
    pub async fn run(&mut self, manifest: &Manifest) -> anyhow::Result<()> {
        tracing::info!(manifest = manifest.name, "starting deployment");

        self.deploy_libraries(manifest).await?;

        for c in manifest.contracts.iter() {
            self.deploy_contract(&c.name, c.contract_name(), &c.args)
                .await?;
        }

        for d in manifest.diamonds.iter() {
            self.deploy_diamond(d).await?;
        }

        tracing::info!(
            manifest = manifest.name,
            contracts = self.book.len(),
            "deployment finished"
        );

        Ok(())
    }

    /// Deploy everything the manifest contracts link to, dependencies first.
    async fn deploy_libraries(&mut self, manifest: &Manifest) -> anyhow::Result<()> {
        let roots = manifest.root_contracts();
        let root_refs = roots
            .iter()
            .map(|(src, name)| (src.as_path(), name.as_str()))
            .collect::<Vec<_>>();

        let deps = self
            .hardhat
            .dependencies(root_refs.as_slice())
            .context("failed to collect library dependencies")?;

        let roots = roots.into_iter().collect::<HashSet<_>>();

        let libraries = deps
            .into_iter()
            .filter(|dep| !roots.contains(dep))
            .collect::<Vec<_>>();

        // Libraries share the address book with the manifest entries, under their bare name.
        let mut lib_names = HashSet::new();
        for (lib_src, lib_name) in libraries.iter() {
            if manifest.deployment_names().any(|n| n == lib_name.as_str()) {
                bail!(
                    "{lib_name} is both a deployment name and a library linked from {}",
                    lib_src.to_string_lossy()
                );
            }
            if !lib_names.insert(lib_name) {
                bail!("more than one library is called {lib_name}");
            }
        }

        for (lib_src, lib_name) in libraries {
            let fqn = self.hardhat.fqn(&lib_src, &lib_name);

            let bytecode = self
                .hardhat
                .bytecode(&lib_src, &lib_name, &self.libraries)
                .with_context(|| format!("failed to load library bytecode {fqn}"))?;

            let address = self
                .deployer
                .deploy(&lib_name, bytecode)
                .await
                .with_context(|| format!("failed to deploy library {fqn}"))?;

            tracing::info!(fqn, ?address, "deployed library");

            self.libraries.insert(fqn, address);
            self.book.insert(lib_name, address);
        }

        Ok(())
    }

    /// Deploy an artifact with constructor arguments and record it under `key`.
    async fn deploy_contract(
        &mut self,
        key: &str,
        contract_name: &str,
        args: &[String],
    ) -> anyhow::Result<Address> {
        let src = contract_src(contract_name);

        let abi = self
            .hardhat
            .abi(&src, contract_name)
            .with_context(|| format!("failed to load {contract_name} ABI"))?;

        let args = tokenize_args(&abi, args, &self.book)
            .with_context(|| format!("invalid constructor arguments for {key}"))?;

        let code = self
            .hardhat
            .deployment_code(&src, contract_name, &self.libraries, args)
            .with_context(|| format!("failed to load {contract_name} bytecode"))?;

        let address = self
            .deployer
            .deploy(key, code)
            .await
            .with_context(|| format!("failed to deploy {key}"))?;

        self.book.insert(key, address);

        Ok(address)
    }

    /// Deploy the facets, then the diamond, then route the facets with a single cut.
    async fn deploy_diamond(&mut self, diamond: &DiamondManifest) -> anyhow::Result<()> {
        for facet in diamond.facets.iter() {
            self.deploy_contract(&diamond.facet_key(facet), facet, &[])
                .await?;
        }

        self.deploy_contract(&diamond.name, diamond.contract_name(), &diamond.args)
            .await?;

        cut_diamond(self.hardhat, self.deployer, diamond, &self.book).await?;

        Ok(())
    }
}

/// Run a manifest and save the address book to `output`.
///
/// After a failure the partial address book is saved as well, so that the cuts can be
/// finished with [cut_diamond]. Failing to save it is only logged, to keep the original error.
pub async fn deploy_manifest<D: Deployer>(
    hardhat: &Hardhat,
    deployer: &D,
    manifest: &Manifest,
    output: &Path,
) -> anyhow::Result<AddressBook> {
    let mut run = DeploymentRun::new(hardhat, deployer);

    if let Err(e) = run.run(manifest).await {
        let book = run.address_book();

        tracing::error!(
            path = ?output,
            deployed = book.len(),
            error = format!("{e:#}"),
            "deployment interrupted"
        );

        if let Err(we) = write_json(output, book) {
            tracing::error!(
                path = ?output,
                error = format!("{we:#}"),
                "failed to save the partial address book"
            );
        }

        return Err(e);
    }

    let book = run.into_address_book();

    write_json(output, &book)?;

    tracing::info!(path = ?output, entries = book.len(), "saved address book");

    Ok(book)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use deployer_hardhat::Hardhat;
    use deployer_planner::{AddressBook, FacetCut, FacetCutAction, Selector, SkipReason};
    use ethers::types::Address;

    use crate::manifest::Manifest;
    use crate::store::read_json;
    use crate::testing::MockDeployer;

    use super::{cut_diamond, deploy_manifest, plan_diamond, DeploymentRun};

    const PLACEHOLDER: &str = "__$0123456789abcdef0123456789abcdef01$__";

    const SUPPORTS_INTERFACE: Selector = Selector([0x01, 0xff, 0xc9, 0xa7]);
    const BALANCE_OF: Selector = Selector([0x70, 0xa0, 0x82, 0x31]);
    const DEPOSIT: Selector = Selector([0xb6, 0xb5, 0x5f, 0x25]);
    const WITHDRAW: Selector = Selector([0x2e, 0x1a, 0x7d, 0x4d]);

    fn params(types: &[&str]) -> Vec<serde_json::Value> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| serde_json::json!({"name": format!("a{i}"), "type": t, "internalType": t}))
            .collect()
    }

    fn function(name: &str, inputs: &[&str], outputs: &[&str]) -> serde_json::Value {
        let mutability = if outputs.is_empty() { "nonpayable" } else { "view" };

        serde_json::json!({
            "type": "function",
            "name": name,
            "inputs": params(inputs),
            "outputs": params(outputs),
            "stateMutability": mutability
        })
    }

    fn write_artifact(
        dir: &Path,
        name: &str,
        abi: serde_json::Value,
        object: &str,
        links: serde_json::Value,
    ) {
        let artifact = serde_json::json!({
            "abi": abi,
            "bytecode": {
                "object": object,
                "linkReferences": links,
            }
        });
        let path = dir.join(format!("{name}.sol"));
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(
            path.join(format!("{name}.json")),
            serde_json::to_string_pretty(&artifact).unwrap(),
        )
        .unwrap();
    }

    /// A vault diamond with two facets sharing a function, and a token passed to the diamond.
    fn test_hardhat() -> (tempfile::TempDir, Hardhat) {
        let dir = tempfile::tempdir().unwrap();

        write_artifact(
            dir.path(),
            "LibShard",
            serde_json::json!([]),
            "0x6001",
            serde_json::json!({}),
        );

        write_artifact(
            dir.path(),
            "ShardToken",
            serde_json::json!([]),
            "0x6002",
            serde_json::json!({}),
        );

        write_artifact(
            dir.path(),
            "VaultIO",
            serde_json::json!([
                function("deposit", &["uint256"], &[]),
                function("withdraw", &["uint256"], &[]),
                function("supportsInterface", &["bytes4"], &["bool"]),
            ]),
            &format!("0x60{PLACEHOLDER}"),
            serde_json::json!({
                "LibShard.sol": { "LibShard": [{ "start": 1, "length": 20 }] }
            }),
        );

        write_artifact(
            dir.path(),
            "VaultView",
            serde_json::json!([
                function("totalDeposits", &[], &["uint256"]),
                function("balanceOf", &["address"], &["uint256"]),
                function("deposit", &["uint256"], &[]),
            ]),
            "0x6003",
            serde_json::json!({}),
        );

        write_artifact(
            dir.path(),
            "ShardVault",
            serde_json::json!([{
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [{"name": "token", "type": "address", "internalType": "address"}]
            }]),
            "0x6004",
            serde_json::json!({}),
        );

        let hardhat = Hardhat::new(dir.path().to_path_buf());

        (dir, hardhat)
    }

    const MANIFEST: &str = r#"
        name = "shard_vault"

        [[contracts]]
        name = "ShardToken"

        [[diamonds]]
        name = "ShardVault"
        args = ["@ShardToken"]
        facets = ["VaultIO", "VaultView"]
        exclude = ["supportsInterface(bytes4)"]
    "#;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[tokio::test]
    async fn deploy_and_cut() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let deployer = MockDeployer::default();

        let mut run = DeploymentRun::new(&hardhat, &deployer);
        run.run(&manifest).await.expect("deployment succeeds");
        let book = run.into_address_book();

        let state = deployer.state.lock().unwrap();

        let names = state
            .deployed
            .iter()
            .map(|(n, _)| n.as_str())
            .collect::<Vec<_>>();

        assert_eq!(
            names,
            vec![
                "LibShard",
                "ShardToken",
                "ShardVault.VaultIO",
                "ShardVault.VaultView",
                "ShardVault"
            ]
        );

        // The facet is linked to the library deployed first.
        let mut linked = vec![0x60];
        linked.extend_from_slice(addr(1).as_bytes());
        assert_eq!(state.deployed[2].1, linked);

        // The diamond constructor got the token address appended.
        let code = &state.deployed[4].1;
        assert_eq!(&code[0..2], &[0x60, 0x04]);
        assert_eq!(&code[2 + 12..], addr(2).as_bytes());

        let expected = AddressBook::from_iter([
            ("LibShard", addr(1)),
            ("ShardToken", addr(2)),
            ("ShardVault.VaultIO", addr(3)),
            ("ShardVault.VaultView", addr(4)),
            ("ShardVault", addr(5)),
        ]);
        assert_eq!(book, expected);

        assert_eq!(state.cuts.len(), 1);
        let (diamond, cuts) = &state.cuts[0];
        assert_eq!(*diamond, addr(5));
        assert_eq!(
            *cuts,
            vec![
                FacetCut {
                    target: addr(3),
                    action: FacetCutAction::Add,
                    selectors: vec![DEPOSIT, WITHDRAW],
                },
                FacetCut {
                    target: addr(4),
                    action: FacetCutAction::Add,
                    selectors: vec![BALANCE_OF, Selector::from_signature("totalDeposits()")],
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_cut_keeps_deployed_addresses() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let deployer = MockDeployer {
            fail_cut: true,
            ..Default::default()
        };

        let mut run = DeploymentRun::new(&hardhat, &deployer);
        let err = run.run(&manifest).await.expect_err("the cut fails");

        assert!(format!("{err:#}").contains("not routed"));
        assert_eq!(run.address_book().len(), 5);
        assert!(deployer.state.lock().unwrap().cuts.is_empty());
    }

    #[tokio::test]
    async fn unknown_reference_stops_the_run() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(
            r#"
            name = "shard_vault"

            [[diamonds]]
            name = "ShardVault"
            args = ["@ShardToken"]
            facets = ["VaultView"]
            "#,
        )
        .unwrap();
        let deployer = MockDeployer::default();

        let mut run = DeploymentRun::new(&hardhat, &deployer);
        assert!(run.run(&manifest).await.is_err());

        // The facet went out before the diamond failed.
        assert_eq!(
            run.address_book().get("ShardVault.VaultView"),
            Some(&addr(1))
        );
        assert!(deployer.state.lock().unwrap().cuts.is_empty());
    }

    #[tokio::test]
    async fn resume_cut_from_address_book() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let diamond = &manifest.diamonds[0];
        let deployer = MockDeployer::default();

        let mut book = AddressBook::from_iter([
            ("ShardVault.VaultIO", addr(10)),
            ("ShardVault.VaultView", addr(11)),
        ]);

        // The diamond itself is missing.
        assert!(cut_diamond(&hardhat, &deployer, diamond, &book)
            .await
            .is_err());

        book.insert("ShardVault", addr(12));

        let plan = cut_diamond(&hardhat, &deployer, diamond, &book)
            .await
            .unwrap();

        let state = deployer.state.lock().unwrap();
        assert!(state.deployed.is_empty());
        assert_eq!(state.cuts, vec![(addr(12), plan.cuts)]);
    }

    #[tokio::test]
    async fn resume_cut_needs_every_facet() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let deployer = MockDeployer::default();

        let book = AddressBook::from_iter([
            ("ShardVault", addr(12)),
            ("ShardVault.VaultIO", addr(10)),
        ]);

        let res = cut_diamond(&hardhat, &deployer, &manifest.diamonds[0], &book).await;
        assert!(res.is_err());
        assert!(deployer.state.lock().unwrap().cuts.is_empty());
    }

    #[test]
    fn plan_without_addresses() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();

        let plan = plan_diamond(&hardhat, &manifest.diamonds[0], &AddressBook::new()).unwrap();

        assert_eq!(plan.cuts.len(), 2);
        assert!(plan.cuts.iter().all(|c| c.target == Address::zero()));
        assert_eq!(plan.selector_count(), 4);
        // One excluded and one shadowed.
        assert_eq!(plan.skipped.len(), 2);
    }

    #[test]
    fn exclusion_applies_to_functions_with_outputs() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();

        let plan = plan_diamond(&hardhat, &manifest.diamonds[0], &AddressBook::new()).unwrap();

        assert!(plan
            .cuts
            .iter()
            .all(|c| !c.selectors.contains(&SUPPORTS_INTERFACE)));

        let excluded = plan
            .skipped
            .iter()
            .find(|s| s.reason == SkipReason::Excluded)
            .expect("supportsInterface is skipped");

        assert_eq!(excluded.facet, "VaultIO");
        assert_eq!(excluded.selector, SUPPORTS_INTERFACE);

        let shadowed = plan
            .skipped
            .iter()
            .find(|s| s.reason != SkipReason::Excluded)
            .expect("deposit is shadowed");

        assert_eq!(shadowed.facet, "VaultView");
        assert_eq!(shadowed.selector, DEPOSIT);
    }

    #[tokio::test]
    async fn reject_library_name_clash() {
        let (_dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(
            r#"
            name = "shard_vault"

            [[contracts]]
            name = "LibShard"
            contract = "ShardToken"

            [[diamonds]]
            name = "ShardVault"
            args = ["@LibShard"]
            facets = ["VaultIO"]
            "#,
        )
        .unwrap();
        let deployer = MockDeployer::default();

        let mut run = DeploymentRun::new(&hardhat, &deployer);
        let err = run.run(&manifest).await.expect_err("the names clash");

        assert!(err.to_string().contains("LibShard"));
        assert!(run.address_book().is_empty());
        assert!(deployer.state.lock().unwrap().deployed.is_empty());
    }

    #[tokio::test]
    async fn deploy_manifest_saves_address_book() {
        let (dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let deployer = MockDeployer::default();
        let output = dir.path().join("deployments").join("shard_vault.json");

        let book = deploy_manifest(&hardhat, &deployer, &manifest, &output)
            .await
            .unwrap();

        let saved: AddressBook = read_json(&output).unwrap();
        assert_eq!(saved, book);
        assert_eq!(saved.len(), 5);
    }

    #[tokio::test]
    async fn deploy_manifest_saves_partial_address_book() {
        let (dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let deployer = MockDeployer {
            fail_cut: true,
            ..Default::default()
        };
        let output = dir.path().join("shard_vault.json");

        let err = deploy_manifest(&hardhat, &deployer, &manifest, &output)
            .await
            .expect_err("the cut fails");

        assert!(format!("{err:#}").contains("not routed"));

        let saved: AddressBook = read_json(&output).unwrap();
        assert_eq!(saved.get("ShardVault"), Some(&addr(5)));
        assert_eq!(saved.len(), 5);
    }

    #[tokio::test]
    async fn deploy_error_survives_failed_save() {
        let (dir, hardhat) = test_hardhat();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let deployer = MockDeployer {
            fail_cut: true,
            ..Default::default()
        };

        // The parent of the output is a regular file, so the book cannot be written.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let output = blocker.join("shard_vault.json");

        let err = deploy_manifest(&hardhat, &deployer, &manifest, &output)
            .await
            .expect_err("the cut fails");

        assert!(format!("{err:#}").contains("not routed"));
        assert!(!output.exists());
    }
}
