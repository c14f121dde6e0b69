//! Address - Identity of a ledger participant
//!
//! Owners, airlines, passengers, oracles and the ledger itself are all
//! identified by an address. Addresses compare case-insensitively, so
//! `0xF17f...` and `0xf17f...` are the same identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant identity
///
/// # Example
/// ```
/// use flightsure_core::Address;
///
/// let a = Address::new("0xF17f52151EbEF6C7334FAD080c5704D77216b732");
/// let b: Address = "0xf17f52151ebef6c7334fad080c5704d77216b732".into();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address, normalizing case and surrounding whitespace
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_lowercase())
    }

    /// Borrow the normalized string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
