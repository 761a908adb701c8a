//! Shared domain types threaded between the Velum components
//!
//! Policy pairs, stored-object metadata, encrypted payloads, session
//! proofs, and the tagged store outcome. These are plain data; all
//! behavior lives in the component crates.

use crate::identifiers::{Address, CapId, ContentId, Epoch, ObjectId, WhitelistId};
use crate::{VelumError, VelumResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use time::OffsetDateTime;

/// Attribute key recording the cap id on a stored object.
pub const ATTR_CAP_ID: &str = "capId";

/// Attribute key recording the whitelist id on a stored object.
pub const ATTR_WHITELIST_ID: &str = "whitelistId";

/// The (whitelist, cap) tuple returned by policy creation.
///
/// This is the unit the rest of the system threads through attribute
/// storage: the whitelist gates decryption, the cap authorizes mutating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPair {
    /// Membership list gating decryption
    pub whitelist_id: WhitelistId,
    /// Capability controlling the whitelist
    pub cap_id: CapId,
}

/// Blob encoding descriptor reported by the blob store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// Full replication across storage nodes
    Replicated,
    /// Erasure-coded (Reed-Solomon) placement
    ReedSolomon,
}

/// Metadata for one stored ciphertext object, as the ledger records it.
///
/// The attribute map (user metadata plus access-control linkage) lives in
/// the blob store's attribute API, not here; see [`EnrichedObject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Ownership handle, ledger-assigned
    pub object_id: ObjectId,
    /// Content-derived id, stable across re-uploads of identical bytes
    pub content_id: ContentId,
    /// Size of the uploaded bytes (the ciphertext)
    pub unencoded_size: u64,
    /// Size after blob-store encoding
    pub encoded_size: u64,
    /// Encoding descriptor
    pub encoding: Encoding,
    /// First epoch of the retention window
    pub start_epoch: Epoch,
    /// Epoch after which retention lapses
    pub end_epoch: Epoch,
    /// Whether the owner may delete before the window lapses
    pub deletable: bool,
}

/// Receipt returned by the blob store for a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobUpload {
    /// Ledger-assigned ownership handle for the new object
    pub object_id: ObjectId,
    /// Content id of the uploaded bytes
    pub content_id: ContentId,
    /// Size after blob-store encoding
    pub encoded_size: u64,
    /// Encoding applied
    pub encoding: Encoding,
    /// Retention window start
    pub start_epoch: Epoch,
    /// Retention window end
    pub end_epoch: Epoch,
    /// Storage cost charged, in the storage asset's base unit
    pub cost: u64,
}

/// The access-control join between storage and policy: the `capId` and
/// `whitelistId` subset of a stored object's attribute map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkageAttributes {
    /// Capability recorded on the object
    pub cap_id: CapId,
    /// Whitelist recorded on the object
    pub whitelist_id: WhitelistId,
}

impl LinkageAttributes {
    /// Build from a policy pair.
    pub fn from_policy(policy: &PolicyPair) -> Self {
        Self {
            cap_id: policy.cap_id,
            whitelist_id: policy.whitelist_id,
        }
    }

    /// Render into attribute-map entries.
    pub fn to_entries(&self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        entries.insert(ATTR_CAP_ID.to_string(), self.cap_id.to_string());
        entries.insert(ATTR_WHITELIST_ID.to_string(), self.whitelist_id.to_string());
        entries
    }

    /// Parse from an object's attribute map. Returns `None` when either
    /// linkage key is absent (the orphaned-object state) and an error when
    /// a present value fails to parse.
    pub fn from_entries(
        entries: &BTreeMap<String, String>,
    ) -> Result<Option<Self>, VelumError> {
        let (cap, whitelist) = match (entries.get(ATTR_CAP_ID), entries.get(ATTR_WHITELIST_ID)) {
            (Some(cap), Some(whitelist)) => (cap, whitelist),
            _ => return Ok(None),
        };
        let cap_id = CapId::from_str(cap)
            .map_err(|e| VelumError::serialization(format!("bad {ATTR_CAP_ID}: {e}")))?;
        let whitelist_id = WhitelistId::from_str(whitelist)
            .map_err(|e| VelumError::serialization(format!("bad {ATTR_WHITELIST_ID}: {e}")))?;
        Ok(Some(Self {
            cap_id,
            whitelist_id,
        }))
    }
}

/// Ciphertext bound to exactly one whitelist id as its decryption identity.
/// Opaque to this layer otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// The encryption identity
    pub identity: WhitelistId,
    /// Threshold `t` the ciphertext was sealed under
    pub threshold: u8,
    /// Opaque ciphertext bytes
    pub bytes: Vec<u8>,
}

impl EncryptedPayload {
    /// Ciphertext length in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True when the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An unexecuted transaction preview calling the policy's approval entry
/// point with the whitelist id as argument.
///
/// Never submitted to the ledger: it exists purely so the threshold
/// encryption service can simulate it against current ledger state to
/// verify the requester is authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPreview {
    /// Address requesting decryption
    pub sender: Address,
    /// Whitelist whose membership is asserted
    pub whitelist: WhitelistId,
}

impl ApprovalPreview {
    /// Build a preview asserting `sender`'s membership in `whitelist`.
    pub fn new(sender: Address, whitelist: WhitelistId) -> Self {
        Self { sender, whitelist }
    }

    /// Canonical digest binding a session proof to this preview.
    pub fn digest(&self) -> VelumResult<[u8; 32]> {
        // bincode of a fixed struct is canonical enough for binding.
        let bytes = bincode::serialize(self)
            .map_err(|e| VelumError::serialization(format!("approval preview: {e}")))?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }
}

/// Short-lived signed assertion binding a requester's address to a specific
/// authorization package. Used once per decrypt attempt; not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProof {
    /// Requesting address
    pub requester: Address,
    /// Requester's ed25519 public key
    pub public_key: [u8; 32],
    /// Digest of the approval preview this proof authorizes
    pub preview_digest: [u8; 32],
    /// Unix timestamp the proof was issued at
    pub issued_at: i64,
    /// Time-to-live in seconds
    pub ttl_secs: u64,
    /// Signature over [`SessionProof::signing_bytes`]
    pub signature: Vec<u8>,
}

impl SessionProof {
    /// Canonical bytes the requester signs.
    pub fn signing_bytes(
        requester: &Address,
        public_key: &[u8; 32],
        preview_digest: &[u8; 32],
        issued_at: i64,
        ttl_secs: u64,
    ) -> VelumResult<Vec<u8>> {
        bincode::serialize(&(requester, public_key, preview_digest, issued_at, ttl_secs))
            .map_err(|e| VelumError::serialization(format!("session proof: {e}")))
    }

    /// The bytes this proof's signature must cover.
    pub fn message(&self) -> VelumResult<Vec<u8>> {
        Self::signing_bytes(
            &self.requester,
            &self.public_key,
            &self.preview_digest,
            self.issued_at,
            self.ttl_secs,
        )
    }

    /// True once the time-to-live has elapsed at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        let expires_at = self.issued_at.saturating_add(self.ttl_secs as i64);
        now.unix_timestamp() >= expires_at
    }
}

/// Receipt for a fully linked store operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreReceipt {
    /// Ownership handle of the new object
    pub object_id: ObjectId,
    /// Content id of the uploaded ciphertext
    pub content_id: ContentId,
    /// Policy created for this object
    pub policy: PolicyPair,
    /// Storage cost charged
    pub storage_cost: u64,
    /// Plaintext size in bytes
    pub plaintext_size: u64,
    /// Ciphertext size in bytes
    pub ciphertext_size: u64,
    /// Blob-store encoding applied
    pub encoding: Encoding,
    /// Retention window end
    pub end_epoch: Epoch,
}

/// Outcome of a `store` call.
///
/// The orphaned state is a tagged variant rather than an error so callers
/// can schedule compensating linkage or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Upload and linkage both succeeded.
    Stored(StoreReceipt),
    /// Upload succeeded but attribute linkage failed: the object exists but
    /// is undiscoverable for decryption. No automatic rollback is performed.
    StoredOrphaned {
        /// The orphaned object, for out-of-band linkage retry
        object_id: ObjectId,
        /// Content id of the orphaned ciphertext
        content_id: ContentId,
        /// Policy that should have been linked
        policy: PolicyPair,
        /// Why linkage failed
        reason: String,
    },
}

impl StoreOutcome {
    /// The receipt, if the store fully succeeded.
    pub fn receipt(&self) -> Option<&StoreReceipt> {
        match self {
            Self::Stored(receipt) => Some(receipt),
            Self::StoredOrphaned { .. } => None,
        }
    }
}

/// A stored object joined with its attributes and expiry projection, as
/// returned by the listing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedObject {
    /// Ledger-side metadata
    pub object: StoredObject,
    /// Attribute map; empty when the per-object fetch degraded
    pub attributes: BTreeMap<String, String>,
    /// Whether the retention window has lapsed at the current epoch
    pub is_expired: bool,
    /// Best-effort wall-clock projection of the window end, assuming a
    /// fixed epoch duration
    pub expires_at: Option<OffsetDateTime>,
}

/// Wallet balances consulted by the pre-flight funds check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Primary (gas) asset balance
    pub primary: u64,
    /// Storage asset balance
    pub storage: u64,
}

/// Which stored objects a burn call targets. Policy objects are never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurnSelector {
    /// Explicit object ids
    Objects(Vec<ObjectId>),
    /// Every owned object whose retention window has lapsed
    Expired,
    /// Every owned object
    All,
}
