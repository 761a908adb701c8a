//! Core identifier types used across the Velum coordination layer
//!
//! Every entity the system threads between collaborators gets a newtype:
//! account addresses, ledger-assigned object ids (and their whitelist/cap
//! refinements), content-derived blob ids, and the blob store's coarse
//! retention epoch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error produced when parsing an identifier from its hex form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier `{input}`: {reason}")]
pub struct ParseIdError {
    /// The rejected input string
    pub input: String,
    /// Why it was rejected
    pub reason: String,
}

fn parse_hex32(input: &str) -> Result<[u8; 32], ParseIdError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(stripped).map_err(|e| ParseIdError {
        input: input.to_string(),
        reason: e.to_string(),
    })?;
    let array: [u8; 32] = bytes.try_into().map_err(|_| ParseIdError {
        input: input.to_string(),
        reason: "expected 32 bytes".to_string(),
    })?;
    Ok(array)
}

/// Account address on the ledger.
///
/// Derived from an ed25519 public key by hashing; displayed with a `0x`
/// prefix like the ledger's own tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the address for an ed25519 public key.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        Self(*blake3::hash(public_key).as_bytes())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(parse_hex32(s)?))
    }
}

/// Ledger-assigned object identifier (ownership handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub [u8; 32]);

impl ObjectId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(parse_hex32(s)?))
    }
}

/// Identifier of an on-ledger whitelist (membership list gating decryption).
///
/// Also serves as the encryption identity: ciphertext is bound to exactly
/// one whitelist id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhitelistId(pub ObjectId);

impl WhitelistId {
    /// Wrap an object id.
    pub const fn new(id: ObjectId) -> Self {
        Self(id)
    }

    /// The underlying object id.
    pub fn object_id(&self) -> ObjectId {
        self.0
    }

    /// Identity bytes for the threshold encryption service.
    pub fn identity_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Display for WhitelistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for WhitelistId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ObjectId::from_str(s)?))
    }
}

/// Identifier of the capability token controlling one whitelist.
///
/// Possession of the cap is the sole authorization check for mutating the
/// whitelist it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapId(pub ObjectId);

impl CapId {
    /// Wrap an object id.
    pub const fn new(id: ObjectId) -> Self {
        Self(id)
    }

    /// The underlying object id.
    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl fmt::Display for CapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CapId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ObjectId::from_str(s)?))
    }
}

/// Content-derived blob identifier, stable across re-uploads of identical
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub [u8; 32]);

impl ContentId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Compute the content id for a byte payload.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(parse_hex32(s)?))
    }
}

/// The blob store's coarse retention time unit. Not wall-clock time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl Epoch {
    /// Create a new epoch value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Return the raw epoch number.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Epoch advanced by `count` units.
    pub const fn plus(self, count: u64) -> Self {
        Self(self.0 + count)
    }

    /// Whole epochs remaining until `end`, zero if already past.
    pub const fn remaining_until(self, end: Epoch) -> u64 {
        end.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Epoch {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display_roundtrip() {
        let address = Address::from_bytes([0xab; 32]);
        let shown = address.to_string();
        assert!(shown.starts_with("0x"));
        assert_eq!(shown.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn object_id_parse_rejects_short_input() {
        let err = "0xdead".parse::<ObjectId>().unwrap_err();
        assert_eq!(err.reason, "expected 32 bytes");
    }

    #[test]
    fn content_id_is_stable_for_identical_bytes() {
        assert_eq!(ContentId::for_bytes(b"blob"), ContentId::for_bytes(b"blob"));
        assert_ne!(ContentId::for_bytes(b"blob"), ContentId::for_bytes(b"bolb"));
    }

    #[test]
    fn epoch_remaining_saturates() {
        assert_eq!(Epoch::new(7).remaining_until(Epoch::new(5)), 0);
        assert_eq!(Epoch::new(5).remaining_until(Epoch::new(7)), 2);
    }
}
