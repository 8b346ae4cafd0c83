use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account address reported by the wallet provider.
///
/// Treated as opaque apart from comparison: hex addresses are case-insensitive, and
/// wallets report checksummed and lower-case forms interchangeably.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display, e.g. `0x9a3f…82dc`.
    pub fn short(&self) -> String {
        let value = self.0.as_str();
        if value.len() <= 12 || !value.is_ascii() {
            return value.to_string();
        }
        format!("{}…{}", &value[..6], &value[value.len() - 4..])
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid contract address {0:?}: expected 0x followed by 40 hex digits")]
pub struct AddressError(pub String);

/// Deployed address of the task ledger contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractAddress(String);

impl ContractAddress {
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let trimmed = value.trim();
        if address_pattern().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(AddressError(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContractAddress {
    fn default() -> Self {
        Self(chaintask_shared::DEFAULT_CONTRACT_ADDRESS.to_string())
    }
}

impl TryFrom<String> for ContractAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContractAddress> for String {
    fn from(value: ContractAddress) -> Self {
        value.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^0[xX][0-9a-fA-F]{40}$").expect("address pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn identities_compare_case_insensitively() {
        let checksummed = Identity::new("0xAbCdEf0000000000000000000000000000000001");
        let lower = Identity::new("0xabcdef0000000000000000000000000000000001");
        assert_eq!(checksummed, lower);

        let mut set = HashSet::new();
        set.insert(checksummed);
        assert!(set.contains(&lower));
    }

    #[test]
    fn short_form_keeps_prefix_and_suffix() {
        let id = Identity::new("0x9a3faF3fd0764C6d3Ec5A40b2a302220494582dc");
        assert_eq!(id.short(), "0x9a3f…82dc");
        assert_eq!(Identity::new("alice").short(), "alice");
    }

    #[test]
    fn contract_address_validation() {
        assert!(ContractAddress::parse(chaintask_shared::DEFAULT_CONTRACT_ADDRESS).is_ok());
        assert!(ContractAddress::parse("0x1234").is_err());
        assert!(ContractAddress::parse("9a3faF3fd0764C6d3Ec5A40b2a302220494582dc").is_err());
        assert!(ContractAddress::parse("0xZZ3faF3fd0764C6d3Ec5A40b2a302220494582dc").is_err());
    }
}
