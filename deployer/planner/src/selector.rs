// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

/// Signature of the ERC-165 introspection function, which the diamond
/// itself implements and therefore must never be routed to a facet.
pub const ERC165_SUPPORTS_INTERFACE: &str = "supportsInterface(bytes4)";

/// Conventional signature of a facet initializer, called through `delegatecall`
/// during the cut rather than exposed on the diamond.
pub const FACET_INITIALIZER: &str = "init(bytes)";

/// The 4 byte function identifier used by the EVM ABI for dispatch,
/// which is the first 4 bytes of the Keccak-256 hash of the signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Derive the selector from a canonical signature such as `"transfer(address,uint256)"`.
    pub fn from_signature(signature: &str) -> Self {
        Self(ethers_core::utils::id(signature))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Selector {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl From<Selector> for [u8; 4] {
    fn from(value: Selector) -> Self {
        value.0
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Selector {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Selector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Selector::from_str(&s).map_err(D::Error::custom)
    }
}

/// Selectors which must never appear in any facet cut, regardless of which facet declares them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExclusionSet(HashSet<Selector>);

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude the selectors of the given function signatures.
    pub fn from_signatures<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        signatures
            .into_iter()
            .map(|s| Selector::from_signature(s.as_ref()))
            .collect()
    }

    /// The standard introspection interface, which the diamond implements itself.
    pub fn erc165() -> Self {
        Self::from_signatures([ERC165_SUPPORTS_INTERFACE])
    }

    pub fn insert(&mut self, selector: Selector) -> bool {
        self.0.insert(selector)
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.0.contains(selector)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Selector> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = Selector>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Selector> for ExclusionSet {
    fn extend<T: IntoIterator<Item = Selector>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}
