// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::{anyhow, bail, Context};
use deployer_planner::FacetDescriptor;
use ethers_core::abi::{Abi, Function, Token};
use ethers_core::types as et;
use serde::Deserialize;
use std::{
    cmp::Ord,
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    hash::Hash,
    path::{Path, PathBuf},
};

/// Contract source as it appears in dependencies, e.g. `"src/libraries/LibDiamond.sol"`, or "Core.sol".
/// It is assumed to contain the file extension.
pub type ContractSource = PathBuf;

/// Contract name as it appears in dependencies, e.g. `"LibDiamond"`.
pub type ContractName = String;

pub type ContractSourceAndName = (ContractSource, ContractName);

/// Fully Qualified Name of a contract, e.g. `"src/libraries/LibDiamond.sol:LibDiamond"`.
pub type FQN = String;

/// Dependency tree for libraries.
///
/// Using a [BTreeMap] for deterministic ordering.
type DependencyTree<T> = BTreeMap<T, HashSet<T>>;

/// Source file of a contract, following the one-contract-per-file convention.
pub fn contract_src(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.sol"))
}

/// Utility to read ABIs and link bytecode from compiler build artifacts.
#[derive(Clone, Debug)]
pub struct Hardhat {
    /// Directory with the build artifacts, the full-fat JSON files
    /// that contain ABI, bytecode, link references, etc.
    contracts_dir: PathBuf,
}

impl Hardhat {
    pub fn new(contracts_dir: PathBuf) -> Self {
        Self { contracts_dir }
    }

    /// Fully qualified name of a source and contract.
    pub fn fqn(&self, contract_source: &Path, contract_name: &str) -> String {
        format!("{}:{}", contract_source.to_string_lossy(), contract_name)
    }

    /// The ABI of the contract.
    pub fn abi(&self, contract_src: impl AsRef<Path>, contract_name: &str) -> anyhow::Result<Abi> {
        let artifact = self.artifact(contract_src.as_ref(), contract_name)?;
        Ok(artifact.abi)
    }

    /// Describe a deployed facet by the canonical signatures of all functions in its ABI.
    pub fn facet_descriptor(
        &self,
        contract_src: impl AsRef<Path>,
        contract_name: &str,
        address: et::Address,
    ) -> anyhow::Result<FacetDescriptor> {
        let abi = self
            .abi(contract_src, contract_name)
            .with_context(|| format!("failed to load facet ABI {contract_name}"))?;

        let signatures = abi.functions().map(canonical_signature).collect();

        Ok(FacetDescriptor::new(contract_name, address, signatures))
    }

    /// Read the bytecode of the contract and replace all links in it with library addresses,
    /// similar to how the [hardhat-ethers](https://github.com/NomicFoundation/hardhat/blob/7cc06ab222be8db43265664c68416fdae3030418/packages/hardhat-ethers/src/internal/helpers.ts#L165C42-L165C42)
    /// plugin does it.
    ///
    /// The contract source is expected to be the logical path to a Solidity contract,
    /// including the extension, ie. a [ContractSource].
    pub fn bytecode(
        &self,
        contract_src: impl AsRef<Path>,
        contract_name: &str,
        libraries: &HashMap<FQN, et::Address>,
    ) -> anyhow::Result<Vec<u8>> {
        let artifact = self.artifact(contract_src.as_ref(), contract_name)?;
        artifact.linked_bytecode(self, libraries)
    }

    /// Link the bytecode and append the ABI encoded constructor arguments.
    ///
    /// Fails if arguments are given to a contract that has no constructor.
    pub fn deployment_code(
        &self,
        contract_src: impl AsRef<Path>,
        contract_name: &str,
        libraries: &HashMap<FQN, et::Address>,
        constructor_args: Vec<Token>,
    ) -> anyhow::Result<Vec<u8>> {
        let artifact = self.artifact(contract_src.as_ref(), contract_name)?;
        let bytecode = artifact.linked_bytecode(self, libraries)?;

        match artifact.abi.constructor() {
            Some(cons) => cons
                .encode_input(bytecode, &constructor_args)
                .with_context(|| format!("failed to encode {contract_name} constructor")),
            None if constructor_args.is_empty() => Ok(bytecode),
            None => bail!("{contract_name} has no constructor but arguments were given"),
        }
    }

    /// Traverse the linked references and return the library contracts to be deployed in topological order.
    ///
    /// The result will include the top contracts as well, and it's up to the caller to filter them out if
    /// they have more complicated deployments including constructors. This is because there can be diamond
    /// facets among them which aren't ABI visible dependencies but should be deployed as libraries.
    pub fn dependencies(
        &self,
        root_contracts: &[(impl AsRef<Path>, &str)],
    ) -> anyhow::Result<Vec<ContractSourceAndName>> {
        let mut deps: DependencyTree<ContractSourceAndName> = Default::default();

        let mut queue = root_contracts
            .iter()
            .map(|(s, c)| (PathBuf::from(s.as_ref()), c.to_string()))
            .collect::<VecDeque<_>>();

        // Construct dependency tree by recursive traversal.
        while let Some(sc) = queue.pop_front() {
            if deps.contains_key(&sc) {
                continue;
            }

            let artifact = self
                .artifact(&sc.0, &sc.1)
                .with_context(|| format!("failed to load dependency artifact: {}", sc.1))?;

            let cds = deps.entry(sc).or_default();

            for (ls, ln) in artifact.libraries_needed() {
                cds.insert((ls.clone(), ln.clone()));
                queue.push_back((ls, ln));
            }
        }

        // Topo-sort the libraries in the order of deployment.
        let sorted = topo_sort(deps)?;

        Ok(sorted)
    }

    /// Concatenate the contracts directory with the expected layout to get
    /// the path to the JSON file of a contract, which is under a directory
    /// named after the Solidity file.
    fn contract_path(&self, contract_src: &Path, contract_name: &str) -> anyhow::Result<PathBuf> {
        let base_name = contract_src
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("failed to produce base name for {contract_src:?}"))?;

        let path = self
            .contracts_dir
            .join(base_name)
            .join(format!("{contract_name}.json"));

        Ok(path)
    }

    /// Parse the build artifact of a contract.
    fn artifact(&self, contract_src: &Path, contract_name: &str) -> anyhow::Result<Artifact> {
        let contract_path = self.contract_path(contract_src, contract_name)?;

        tracing::debug!(path = ?contract_path, "reading contract artifact");

        let json = std::fs::read_to_string(&contract_path)
            .with_context(|| format!("failed to read {contract_path:?}"))?;

        let artifact =
            serde_json::from_str::<Artifact>(&json).context("failed to parse build artifact")?;

        Ok(artifact)
    }
}

#[derive(Deserialize)]
struct Artifact {
    pub abi: Abi,
    pub bytecode: Bytecode,
}

impl Artifact {
    // Collect the libraries this contract needs.
    pub fn libraries_needed(&self) -> Vec<(ContractSource, ContractName)> {
        self.bytecode
            .link_references
            .iter()
            .flat_map(|(lib_src, links)| {
                links
                    .keys()
                    .map(|lib_name| (lib_src.to_owned(), lib_name.to_owned()))
            })
            .collect()
    }

    pub fn library_positions(
        &self,
        lib_src: &ContractSource,
        lib_name: &ContractName,
    ) -> impl Iterator<Item = &Position> {
        match self
            .bytecode
            .link_references
            .get(lib_src)
            .and_then(|links| links.get(lib_name))
        {
            Some(ps) => ps.iter(),
            None => [].iter(),
        }
    }

    /// Replace all library references with their address.
    ///
    /// Entries in the library address map that we end up not needing are not an error,
    /// so callers can pass everything deployed so far.
    pub fn linked_bytecode(
        &self,
        hardhat: &Hardhat,
        libraries: &HashMap<FQN, et::Address>,
    ) -> anyhow::Result<Vec<u8>> {
        // Hexadecimal format with placeholders for library references.
        let mut bytecode = self.bytecode.object.clone();

        for (lib_src, lib_name) in self.libraries_needed() {
            // References can be given with Fully Qualified Name, or just the contract name,
            // but they must be unique and unambiguous.
            let fqn = hardhat.fqn(&lib_src, &lib_name);

            let lib_addr = match (libraries.get(&fqn), libraries.get(&lib_name)) {
                (None, None) => {
                    bail!("failed to resolve library: {fqn}")
                }
                (Some(_), Some(_)) => bail!("ambiguous library: {fqn}"),
                (Some(addr), None) => addr,
                (None, Some(addr)) => addr,
            };

            let lib_addr = hex::encode(lib_addr.0);

            for pos in self.library_positions(&lib_src, &lib_name) {
                let start = 2 + pos.start * 2;
                let end = start + pos.length * 2;
                if end > bytecode.len() {
                    bail!("link reference to {fqn} is out of the bytecode range");
                }
                bytecode.replace_range(start..end, &lib_addr);
            }
        }

        let bytecode = hex::decode(bytecode.trim_start_matches("0x"))
            .context("failed to decode contract from hex")?;

        Ok(bytecode)
    }
}

/// Match the `"bytecode"` entry in the build artifact.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Bytecode {
    /// Hexadecimal format with placeholders for links.
    pub object: String,
    #[serde(default)]
    pub link_references: HashMap<ContractSource, HashMap<ContractName, Vec<Position>>>,
}

/// Indicate where a placeholder appears in the bytecode object.
#[derive(Deserialize)]
struct Position {
    pub start: usize,
    pub length: usize,
}

/// The signature a selector is derived from: the name and the input types only.
///
/// [Function::signature] would append the outputs, e.g. `"balanceOf(address):(uint256)"`.
fn canonical_signature(f: &Function) -> String {
    let inputs = f
        .inputs
        .iter()
        .map(|p| p.kind.to_string())
        .collect::<Vec<_>>()
        .join(",");

    format!("{}({inputs})", f.name)
}

/// Return elements of a dependency tree in topological order.
fn topo_sort<T>(mut dependency_tree: DependencyTree<T>) -> anyhow::Result<Vec<T>>
where
    T: Eq + PartialEq + Hash + Ord + Clone,
{
    let mut sorted = Vec::new();

    while !dependency_tree.is_empty() {
        let leaf = match dependency_tree.iter().find(|(_, ds)| ds.is_empty()) {
            Some((k, _)) => k.clone(),
            None => bail!("circular reference in the dependencies"),
        };

        dependency_tree.remove(&leaf);

        for (_, ds) in dependency_tree.iter_mut() {
            ds.remove(&leaf);
        }

        sorted.push(leaf);
    }

    Ok(sorted)
}
