//! # Velum Core
//!
//! Foundation crate for the Velum coordination layer: strongly typed
//! identifiers, the unified error type, domain types shared by every
//! component, and the effect traits for the four external collaborators
//! (ledger, threshold encryption service, blob store, wallet/signer).
//!
//! This crate defines **what** the collaborators do; handlers elsewhere
//! define **how**. No I/O happens here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Strongly typed identifiers (addresses, object ids, content ids, epochs)
pub mod identifiers;

/// Unified error type for all Velum operations
pub mod error;

/// Typed ledger command and effect shapes
pub mod ledger;

/// Shared domain types (stored objects, policies, proofs, receipts)
pub mod types;

/// Effect trait definitions for external collaborators
pub mod effects;

pub use error::{VelumError, VelumResult};
pub use identifiers::{Address, CapId, ContentId, Epoch, ObjectId, WhitelistId};
pub use ledger::{
    CreatedObject, ExecutionStatus, LedgerCall, LedgerFault, LedgerQuery, ObjectKind, Transaction,
    TransactionDigest, TransactionEffects,
};
pub use types::{
    ApprovalPreview, BlobUpload, BurnSelector, Encoding, EncryptedPayload, EnrichedObject,
    LinkageAttributes, PolicyPair, SessionProof, StoreOutcome, StoreReceipt, StoredObject,
    WalletBalance, ATTR_CAP_ID, ATTR_WHITELIST_ID,
};

pub use effects::{BlobEffects, DecryptRequest, LedgerEffects, SealEffects, SignerEffects};
