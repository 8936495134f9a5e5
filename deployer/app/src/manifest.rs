// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! TOML descriptions of what a deployment run consists of.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use deployer_hardhat::contract_src;
use deployer_planner::{AddressBook, ExclusionSet};
use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::{Abi, ParamType, Token};
use ethers::types::Address;
use serde::Deserialize;

/// A plain contract, e.g. a token, deployed with its constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractManifest {
    /// Name of the deployment in the address book.
    pub name: String,
    /// Name of the artifact, if different from the deployment name.
    #[serde(default)]
    pub contract: Option<String>,
    /// Constructor arguments, tokenized against the constructor ABI.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ContractManifest {
    pub fn contract_name(&self) -> &str {
        self.contract.as_deref().unwrap_or(&self.name)
    }
}

/// A diamond proxy and the facets to cut into it, in order of precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiamondManifest {
    pub name: String,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub facets: Vec<String>,
    /// Signatures which must not be routed by the diamond, e.g. `"supportsInterface(bytes4)"`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl DiamondManifest {
    pub fn contract_name(&self) -> &str {
        self.contract.as_deref().unwrap_or(&self.name)
    }

    pub fn exclusions(&self) -> ExclusionSet {
        ExclusionSet::from_signatures(self.exclude.iter())
    }

    /// Address book key of a facet of this diamond.
    pub fn facet_key(&self, facet: &str) -> String {
        format!("{}.{}", self.name, facet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Name of the run, which is also the name of the address book file.
    pub name: String,
    #[serde(default)]
    pub contracts: Vec<ContractManifest>,
    #[serde(default)]
    pub diamonds: Vec<DiamondManifest>,
}

impl Manifest {
    /// Read and validate a manifest file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {path:?}"))?;

        Self::from_toml(&toml).with_context(|| format!("invalid manifest {path:?}"))
    }

    pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(toml).context("failed to parse manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            bail!("the manifest name cannot be empty");
        }
        if self.contracts.is_empty() && self.diamonds.is_empty() {
            bail!("manifest {} has nothing to deploy", self.name);
        }

        let mut names = HashSet::new();

        for name in self.deployment_names() {
            if name.is_empty() {
                bail!("deployment names cannot be empty");
            }
            if name.starts_with('@') || name.contains('.') {
                bail!("deployment name {name} cannot start with '@' or contain '.'");
            }
            if !names.insert(name) {
                bail!("duplicate deployment name: {name}");
            }
        }

        for d in self.diamonds.iter() {
            if d.facets.is_empty() {
                bail!("diamond {} needs at least one facet", d.name);
            }
            let mut facets = HashSet::new();
            for f in d.facets.iter() {
                if !facets.insert(f) {
                    bail!("diamond {} lists facet {f} more than once", d.name);
                }
            }
        }

        Ok(())
    }

    /// Address book keys of the contracts and diamonds, not counting facets.
    pub fn deployment_names(&self) -> impl Iterator<Item = &str> {
        self.contracts
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.diamonds.iter().map(|d| d.name.as_str()))
    }

    /// Every artifact deployed by the manifest itself, as opposed to the libraries they link to.
    pub fn root_contracts(&self) -> Vec<(PathBuf, String)> {
        let contracts = self.contracts.iter().map(|c| c.contract_name());

        let diamonds = self.diamonds.iter().flat_map(|d| {
            d.facets
                .iter()
                .map(|f| f.as_str())
                .chain(std::iter::once(d.contract_name()))
        });

        let mut seen = HashSet::new();
        contracts
            .chain(diamonds)
            .filter(|name| seen.insert(*name))
            .map(|name| (contract_src(name), name.to_owned()))
            .collect()
    }
}

/// Turn the manifest arguments into constructor tokens.
///
/// Arguments of the form `@Name` refer to a contract already in the address book.
pub fn tokenize_args(abi: &Abi, args: &[String], book: &AddressBook) -> anyhow::Result<Vec<Token>> {
    let params = match abi.constructor() {
        Some(cons) => &cons.inputs,
        None if args.is_empty() => return Ok(Vec::new()),
        None => bail!("the contract has no constructor but {} arguments were given", args.len()),
    };

    if params.len() != args.len() {
        bail!(
            "the constructor takes {} arguments but {} were given",
            params.len(),
            args.len()
        );
    }

    params
        .iter()
        .zip(args.iter())
        .map(|(param, arg)| {
            tokenize_arg(&param.kind, arg, book)
                .with_context(|| format!("invalid value for constructor parameter {}", param.name))
        })
        .collect()
}

fn tokenize_arg(kind: &ParamType, arg: &str, book: &AddressBook) -> anyhow::Result<Token> {
    if let Some(name) = arg.strip_prefix('@') {
        let address = book
            .get(name)
            .ok_or_else(|| anyhow!("{name} has not been deployed before this contract"))?;

        return match kind {
            ParamType::Address => Ok(Token::Address(*address)),
            other => bail!("{arg} is an address but the parameter type is {other}"),
        };
    }

    let token = match kind {
        ParamType::Address => Address::from_str(arg)
            .map(Token::Address)
            .map_err(|e| anyhow!("invalid address {arg}: {e}"))?,
        ParamType::Bytes | ParamType::FixedBytes(_) => {
            LenientTokenizer::tokenize(kind, arg.strip_prefix("0x").unwrap_or(arg))?
        }
        _ => LenientTokenizer::tokenize(kind, arg)?,
    };

    Ok(token)
}
