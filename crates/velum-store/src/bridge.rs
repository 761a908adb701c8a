//! Blob store bridge: the write and read paths end to end

use crate::attributes::AttributeIndex;
use async_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use velum_core::{
    BlobEffects, BurnSelector, ContentId, EncryptedPayload, EnrichedObject, LedgerEffects,
    ObjectId, PolicyPair, SealEffects, SignerEffects, StoreOutcome, StoreReceipt, VelumError,
    VelumResult, WalletBalance,
};
use velum_seal::SealCoordinator;

/// Assumed fixed wall-clock length of one retention epoch, used only for
/// the best-effort expiry projection in listings.
pub const EPOCH_DURATION: Duration = Duration::days(1);

/// Result of a burn call: what was deleted and what was skipped because
/// the object is not deletable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReport {
    /// Objects deleted
    pub burned: Vec<ObjectId>,
    /// Objects left in place because their deletable flag is off
    pub skipped_not_deletable: Vec<ObjectId>,
}

/// Orchestrates encrypt→upload→link on write and resolve→download→decrypt
/// on read for one wallet.
///
/// Owns the contentId→objectId index (rebuilt from the owned-object
/// listing on miss, refreshed by store/list/burn) and the documented
/// partial-failure handling: upload-then-linkage-failure leaves the object
/// stored but orphaned, surfaced as a tagged outcome.
pub struct BlobBridge<L, E, B, S> {
    ledger: Arc<L>,
    blob: Arc<B>,
    signer: Arc<S>,
    seal: SealCoordinator<L, E>,
    attributes: AttributeIndex<B>,
    content_index: RwLock<HashMap<ContentId, ObjectId>>,
}

impl<L, E, B, S> BlobBridge<L, E, B, S>
where
    L: LedgerEffects,
    E: SealEffects,
    B: BlobEffects,
    S: SignerEffects,
{
    /// Wire a bridge over the collaborator handles.
    pub fn new(
        ledger: Arc<L>,
        blob: Arc<B>,
        seal: SealCoordinator<L, E>,
        signer: Arc<S>,
    ) -> Self {
        let attributes = AttributeIndex::new(Arc::clone(&blob));
        Self {
            ledger,
            blob,
            signer,
            seal,
            attributes,
            content_index: RwLock::new(HashMap::new()),
        }
    }

    /// The attribute index this bridge links through.
    pub fn attribute_index(&self) -> &AttributeIndex<B> {
        &self.attributes
    }

    /// Encrypt and store `plaintext`, requesting `retention_epochs` of
    /// retention.
    ///
    /// The wallet is checked before any blob store cost is incurred. If the
    /// upload fails nothing was persisted and no linkage call is made. If
    /// the upload succeeds but linkage fails the object is stored but
    /// orphaned: the outcome carries its object id for out-of-band linkage
    /// retry, and nothing is rolled back.
    pub async fn store(
        &self,
        plaintext: &[u8],
        retention_epochs: u64,
        deletable: bool,
        extra_attributes: BTreeMap<String, String>,
    ) -> VelumResult<StoreOutcome> {
        let sender = self.signer.address();
        self.preflight_funds(sender).await?;

        let (payload, policy) = self.seal.encode(plaintext, sender).await?;
        let envelope = bincode::serialize(&payload)
            .map_err(|e| VelumError::serialization(format!("sealed envelope: {e}")))?;
        let ciphertext_size = envelope.len() as u64;

        let upload = self
            .blob
            .upload(sender, envelope, retention_epochs, deletable)
            .await?;

        let outcome = match self
            .attributes
            .link(upload.object_id, &policy, extra_attributes)
            .await
        {
            Ok(()) => {
                info!(
                    object = %upload.object_id,
                    content = %upload.content_id,
                    cost = upload.cost,
                    end_epoch = %upload.end_epoch,
                    "stored and linked object"
                );
                StoreOutcome::Stored(StoreReceipt {
                    object_id: upload.object_id,
                    content_id: upload.content_id,
                    policy,
                    storage_cost: upload.cost,
                    plaintext_size: plaintext.len() as u64,
                    ciphertext_size,
                    encoding: upload.encoding,
                    end_epoch: upload.end_epoch,
                })
            }
            Err(error) => {
                warn!(
                    object = %upload.object_id,
                    content = %upload.content_id,
                    %error,
                    "upload succeeded but linkage failed; object is orphaned"
                );
                StoreOutcome::StoredOrphaned {
                    object_id: upload.object_id,
                    content_id: upload.content_id,
                    policy,
                    reason: error.to_string(),
                }
            }
        };

        self.content_index
            .write()
            .await
            .insert(upload.content_id, upload.object_id);
        Ok(outcome)
    }

    /// Retry attribute linkage for a stored-but-orphaned object.
    ///
    /// The compensating path for a store that came back
    /// [`StoreOutcome::StoredOrphaned`]: the caller keeps the object id
    /// and policy from that outcome and retries once the attribute store
    /// recovers. A retry that fails again surfaces `LinkageFailed` with
    /// the object id so the caller can keep scheduling.
    pub async fn relink(&self, object: ObjectId, policy: &PolicyPair) -> VelumResult<()> {
        self.attributes
            .link(object, policy, BTreeMap::new())
            .await
            .map_err(|error| VelumError::LinkageFailed {
                object,
                message: error.to_string(),
            })?;
        info!(%object, whitelist = %policy.whitelist_id, "relinked orphaned object");
        Ok(())
    }

    /// Resolve, download, and decrypt the content for `content_id`.
    ///
    /// Fails with `NotFound` when no owned object matches and with
    /// `LinkageMissing` when the object exists but has no recorded
    /// whitelist (an orphaned object).
    pub async fn read(&self, content_id: ContentId) -> VelumResult<Vec<u8>> {
        let object_id = self.resolve_object(content_id).await?;
        let linkage = self.attributes.resolve(object_id).await?;

        let envelope = self.blob.download(content_id).await?;
        let payload: EncryptedPayload = bincode::deserialize(&envelope)
            .map_err(|e| VelumError::serialization(format!("sealed envelope: {e}")))?;
        if payload.identity != linkage.whitelist_id {
            return Err(VelumError::internal(format!(
                "object {object_id} linkage names whitelist {} but its envelope is bound to {}",
                linkage.whitelist_id, payload.identity
            )));
        }

        self.seal
            .decode(payload, linkage.whitelist_id, self.signer.as_ref())
            .await
    }

    /// Enumerate owned objects with attributes and expiry projection.
    ///
    /// A failing attribute fetch degrades that one object's attributes to
    /// empty rather than failing the whole listing.
    pub async fn list(&self, include_expired: bool) -> VelumResult<Vec<EnrichedObject>> {
        let sender = self.signer.address();
        let epoch = self.ledger.current_epoch().await?;
        let objects = self.ledger.owned_objects(sender).await?;
        self.rebuild_index(&objects).await;

        let now = OffsetDateTime::now_utc();
        let mut listing = Vec::with_capacity(objects.len());
        for object in objects {
            let remaining = epoch.remaining_until(object.end_epoch);
            let is_expired = remaining == 0;
            if is_expired && !include_expired {
                continue;
            }
            let attributes = match self.blob.attributes(object.object_id).await {
                Ok(attributes) => attributes,
                Err(error) => {
                    warn!(
                        object = %object.object_id,
                        %error,
                        "attribute fetch failed; listing object with empty attributes"
                    );
                    BTreeMap::new()
                }
            };
            // The projection saturates for very long windows instead of
            // overflowing the datetime range.
            let expires_at = if is_expired {
                None
            } else {
                let factor = i32::try_from(remaining).unwrap_or(i32::MAX);
                now.checked_add(EPOCH_DURATION * factor)
            };
            listing.push(EnrichedObject {
                object,
                attributes,
                is_expired,
                expires_at,
            });
        }
        Ok(listing)
    }

    /// Delete stored objects. Policy objects are never deleted; objects
    /// whose deletable flag is off are reported as skipped, not forced.
    pub async fn burn(&self, selector: BurnSelector) -> VelumResult<BurnReport> {
        let sender = self.signer.address();
        let epoch = self.ledger.current_epoch().await?;
        let owned = self.ledger.owned_objects(sender).await?;

        let targets: Vec<_> = match &selector {
            BurnSelector::Objects(ids) => {
                let mut targets = Vec::with_capacity(ids.len());
                for id in ids {
                    let object = owned
                        .iter()
                        .find(|object| object.object_id == *id)
                        .cloned()
                        .ok_or_else(|| {
                            VelumError::not_found(format!("owned object {id}"))
                        })?;
                    targets.push(object);
                }
                targets
            }
            BurnSelector::Expired => owned
                .into_iter()
                .filter(|object| epoch.remaining_until(object.end_epoch) == 0)
                .collect(),
            BurnSelector::All => owned,
        };

        let mut report = BurnReport::default();
        for object in targets {
            if !object.deletable {
                report.skipped_not_deletable.push(object.object_id);
                continue;
            }
            self.blob.delete(object.object_id).await?;
            self.content_index.write().await.remove(&object.content_id);
            report.burned.push(object.object_id);
        }
        info!(
            burned = report.burned.len(),
            skipped = report.skipped_not_deletable.len(),
            "burn finished"
        );
        Ok(report)
    }

    /// Fetch an object's attribute map.
    pub async fn get_attributes(
        &self,
        object: ObjectId,
    ) -> VelumResult<BTreeMap<String, String>> {
        self.attributes.get(object).await
    }

    /// Merge user metadata into an object's attribute map.
    pub async fn add_attributes(
        &self,
        object: ObjectId,
        entries: BTreeMap<String, String>,
    ) -> VelumResult<()> {
        self.attributes.add(object, entries).await
    }

    /// Wallet balances for this bridge's signer.
    pub async fn wallet_balance(&self) -> VelumResult<WalletBalance> {
        self.ledger.balance(self.signer.address()).await
    }

    async fn preflight_funds(&self, sender: velum_core::Address) -> VelumResult<()> {
        let WalletBalance { primary, storage } = self.ledger.balance(sender).await?;
        if primary == 0 {
            return Err(VelumError::InsufficientFunds {
                coin: "primary".to_string(),
                available: primary,
            });
        }
        if storage == 0 {
            return Err(VelumError::InsufficientFunds {
                coin: "storage".to_string(),
                available: storage,
            });
        }
        Ok(())
    }

    async fn resolve_object(&self, content_id: ContentId) -> VelumResult<ObjectId> {
        if let Some(object_id) = self.content_index.read().await.get(&content_id) {
            return Ok(*object_id);
        }
        let objects = self.ledger.owned_objects(self.signer.address()).await?;
        self.rebuild_index(&objects).await;
        self.content_index
            .read()
            .await
            .get(&content_id)
            .copied()
            .ok_or_else(|| {
                VelumError::not_found(format!("content {content_id} among owned objects"))
            })
    }

    async fn rebuild_index(&self, objects: &[velum_core::StoredObject]) {
        let mut index = self.content_index.write().await;
        index.clear();
        for object in objects {
            index.insert(object.content_id, object.object_id);
        }
    }
}
