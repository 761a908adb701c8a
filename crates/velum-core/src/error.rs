//! Unified error system for Velum
//!
//! One error type covers the whole taxonomy: ledger rejections, policy
//! authorization, decrypt-time denials, orphaned-object states, and the
//! pre-flight funds check. Every variant carries the ids involved so a
//! caller can retry or investigate; nothing is silently swallowed.

use crate::identifiers::{Address, CapId, ObjectId, WhitelistId};

/// Result alias used across all Velum crates.
pub type VelumResult<T> = Result<T, VelumError>;

/// Unified error type for all Velum operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VelumError {
    /// The ledger rejected a transaction, or the submission itself failed.
    #[error("transaction failed: {message}")]
    TransactionFailure {
        /// Ledger-reported or transport-level failure reason
        message: String,
    },

    /// The supplied cap does not control the target whitelist.
    #[error("cap {cap} does not control whitelist {whitelist}")]
    AuthorizationDenied {
        /// Cap offered as authority
        cap: CapId,
        /// Whitelist the mutation targeted
        whitelist: WhitelistId,
    },

    /// The requester is not a current whitelist member at decrypt time.
    #[error("access denied: {address} is not a member of whitelist {whitelist}")]
    AccessDenied {
        /// Requesting address
        address: Address,
        /// Whitelist gating the ciphertext
        whitelist: WhitelistId,
    },

    /// Fewer key servers responded than the decryption threshold requires.
    #[error("collected {collected} of {threshold} required key shares")]
    InsufficientShares {
        /// Shares actually collected
        collected: u8,
        /// Threshold `t` the ciphertext was sealed under
        threshold: u8,
    },

    /// The session proof's time-to-live elapsed before shares were collected.
    #[error("session proof for {address} expired (ttl {ttl_secs}s)")]
    ExpiredSessionProof {
        /// Address the proof was bound to
        address: Address,
        /// Time-to-live the proof carried
        ttl_secs: u64,
    },

    /// A content id, object id, or whitelist id did not resolve.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the unresolvable id
        what: String,
    },

    /// A successful policy transaction's effects lacked the expected object
    /// kinds. Indicates a contract/ABI mismatch, not a ledger failure.
    #[error("policy objects missing from effects of transaction {digest}")]
    LinkageNotFound {
        /// Digest of the suspicious transaction
        digest: String,
    },

    /// Upload succeeded but attribute linkage failed: the object is stored
    /// yet orphaned. Carries the object id so a caller can retry linkage
    /// out-of-band.
    #[error("linkage attachment failed for stored object {object}: {message}")]
    LinkageFailed {
        /// The orphaned object
        object: ObjectId,
        /// Underlying attachment failure
        message: String,
    },

    /// The object exists but has no recorded access-control linkage.
    #[error("object {object} has no access-control linkage")]
    LinkageMissing {
        /// The orphaned object
        object: ObjectId,
    },

    /// Pre-flight balance check failed before any blob store cost.
    #[error("insufficient {coin} balance: {available} available")]
    InsufficientFunds {
        /// Which asset was short
        coin: String,
        /// Balance observed
        available: u64,
    },

    /// Whitelist/cap creation failed while preparing an encryption.
    #[error("policy creation failed: {message}")]
    PolicyCreationFailed {
        /// Underlying failure
        message: String,
    },

    /// The threshold encryption service could not produce ciphertext.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Underlying failure
        message: String,
    },

    /// Ownership transfer did not reach success status on the ledger.
    #[error("transfer of {object} failed: {message}")]
    TransferFailed {
        /// Object whose transfer failed
        object: ObjectId,
        /// Ledger-reported reason
        message: String,
    },

    /// Encoding or decoding of a boundary payload failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// What failed to (de)serialize
        message: String,
    },

    /// Invariant violation inside this layer.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violated invariant
        message: String,
    },
}

impl VelumError {
    /// Create a transaction failure error.
    pub fn transaction_failure(message: impl Into<String>) -> Self {
        Self::TransactionFailure {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a policy creation error.
    pub fn policy_creation_failed(message: impl Into<String>) -> Self {
        Self::PolicyCreationFailed {
            message: message.into(),
        }
    }

    /// Create an encryption error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for the two orphaned-object states (`LinkageFailed`,
    /// `LinkageMissing`).
    pub fn is_orphan_state(&self) -> bool {
        matches!(
            self,
            Self::LinkageFailed { .. } | Self::LinkageMissing { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::ObjectId;

    #[test]
    fn error_messages_carry_ids() {
        let object = ObjectId::from_bytes([3; 32]);
        let err = VelumError::LinkageMissing { object };
        assert!(err.to_string().contains(&object.to_string()));
        assert!(err.is_orphan_state());
    }

    #[test]
    fn insufficient_funds_names_the_coin() {
        let err = VelumError::InsufficientFunds {
            coin: "storage".to_string(),
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient storage balance: 0 available"
        );
    }
}
