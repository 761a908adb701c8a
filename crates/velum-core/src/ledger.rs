//! Typed ledger command and effect shapes
//!
//! Every call to the ledger collaborator goes through these tagged unions,
//! and every response is parsed into them at the boundary. Unrecognized
//! shapes are rejected there instead of propagating untyped data inward.

use crate::identifiers::{Address, CapId, ObjectId, WhitelistId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single command inside a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCall {
    /// Create a whitelist and its controlling cap atomically.
    CreatePolicy,
    /// Add one member to a whitelist under cap authority.
    AddMember {
        /// Whitelist to mutate
        whitelist: WhitelistId,
        /// Cap asserted as authority
        cap: CapId,
        /// Member to add
        member: Address,
    },
    /// Remove one member from a whitelist under cap authority.
    RemoveMember {
        /// Whitelist to mutate
        whitelist: WhitelistId,
        /// Cap asserted as authority
        cap: CapId,
        /// Member to remove
        member: Address,
    },
    /// Reassign ownership of one object.
    TransferObject {
        /// Object to transfer
        object: ObjectId,
        /// New owner
        recipient: Address,
    },
}

/// A batched transaction: one sender, one or more calls, applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Submitting (and paying) address
    pub sender: Address,
    /// Commands applied in order; all-or-nothing
    pub calls: Vec<LedgerCall>,
}

impl Transaction {
    /// Build a transaction for `sender` with the given calls.
    pub fn new(sender: Address, calls: Vec<LedgerCall>) -> Self {
        Self { sender, calls }
    }

    /// Build a single-call transaction.
    pub fn single(sender: Address, call: LedgerCall) -> Self {
        Self::new(sender, vec![call])
    }
}

/// Read-only simulation against the ledger: no fee, no state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerQuery {
    /// Invoke the whitelist member getter; the payload is a u32
    /// little-endian count followed by that many 32-byte addresses.
    WhitelistMembers {
        /// Whitelist to enumerate
        whitelist: WhitelistId,
    },
}

/// Digest identifying an executed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionDigest(pub [u8; 32]);

impl TransactionDigest {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Why the ledger refused or reverted a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerFault {
    /// The asserted cap does not control the target whitelist (or is not
    /// held by the sender).
    CapMismatch {
        /// Cap offered as authority
        cap: CapId,
        /// Whitelist the mutation targeted
        whitelist: WhitelistId,
    },
    /// A referenced object id did not resolve.
    UnknownObject {
        /// Display form of the unresolvable id
        id: String,
    },
    /// The sender could not cover the transaction fee.
    InsufficientGas,
    /// Contract-level abort with an opaque message.
    Aborted {
        /// Abort reason as reported by the ledger
        message: String,
    },
}

impl fmt::Display for LedgerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapMismatch { cap, whitelist } => {
                write!(f, "cap {cap} does not control whitelist {whitelist}")
            }
            Self::UnknownObject { id } => write!(f, "unknown object {id}"),
            Self::InsufficientGas => write!(f, "insufficient gas"),
            Self::Aborted { message } => write!(f, "aborted: {message}"),
        }
    }
}

/// Outcome status inside a transaction's effect record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// All calls applied.
    Success,
    /// Nothing applied; carries the typed fault.
    Failure {
        /// Why execution failed
        fault: LedgerFault,
    },
}

impl ExecutionStatus {
    /// True when the transaction applied.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Kind tag for objects appearing in a transaction's effect record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A membership whitelist
    Whitelist,
    /// A whitelist-controlling capability
    Cap,
    /// A stored blob's ownership object
    StoredBlob,
}

/// One object created by a transaction, matched by kind when extracting
/// policy ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedObject {
    /// Ledger-assigned id
    pub id: ObjectId,
    /// Object kind tag
    pub kind: ObjectKind,
}

/// Effect record returned for every executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEffects {
    /// Digest of the executed transaction
    pub digest: TransactionDigest,
    /// Success or typed failure
    pub status: ExecutionStatus,
    /// Objects the transaction created, tagged by kind
    pub created: Vec<CreatedObject>,
}

impl TransactionEffects {
    /// First created object of the given kind, if any.
    pub fn created_of_kind(&self, kind: ObjectKind) -> Option<ObjectId> {
        self.created
            .iter()
            .find(|object| object.kind == kind)
            .map(|object| object.id)
    }
}
