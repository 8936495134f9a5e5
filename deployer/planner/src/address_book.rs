// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};

/// Logical component name to deployed contract address.
///
/// Serialized as a flat JSON object, e.g. `{"Core": "0x5fbd..."}`.
/// Using a [BTreeMap] so the persisted file has a stable key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook(BTreeMap<String, Address>);

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an address, returning the one it replaced, if any.
    pub fn insert(&mut self, name: impl Into<String>, address: Address) -> Option<Address> {
        self.0.insert(name.into(), address)
    }

    pub fn get(&self, name: &str) -> Option<&Address> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Address)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Address)> for AddressBook {
    fn from_iter<T: IntoIterator<Item = (S, Address)>>(iter: T) -> Self {
        let mut book = Self::default();
        book.extend(iter);
        book
    }
}

impl<S: Into<String>> Extend<(S, Address)> for AddressBook {
    fn extend<T: IntoIterator<Item = (S, Address)>>(&mut self, iter: T) {
        for (name, address) in iter {
            self.insert(name, address);
        }
    }
}

/// Assemble an address book from deployment results; a repeated name keeps the last address.
pub fn assemble_address_book<I, S>(entries: I) -> AddressBook
where
    I: IntoIterator<Item = (S, Address)>,
    S: Into<String>,
{
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use ethers_core::types::Address;

    use super::{assemble_address_book, AddressBook};

    #[test]
    fn last_write_wins() {
        let a = Address::from_low_u64_be(0xA);
        let b = Address::from_low_u64_be(0xB);
        let c = Address::from_low_u64_be(0xC);

        let book = assemble_address_book([("X", a), ("Y", b), ("X", c)]);

        assert_eq!(book.len(), 2);
        assert_eq!(book.get("X"), Some(&c));
        assert_eq!(book.get("Y"), Some(&b));
    }

    #[test]
    fn flat_json_object() {
        let book = assemble_address_book([("Core", Address::from_low_u64_be(1))]);
        let json = serde_json::to_value(&book).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"Core": "0x0000000000000000000000000000000000000001"})
        );

        let back: AddressBook = serde_json::from_value(json).unwrap();
        assert_eq!(back, book);
    }
}
