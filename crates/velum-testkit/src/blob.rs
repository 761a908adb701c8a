//! In-memory content-addressed blob store handler
//!
//! Shares a ledger handle so uploads register ownership objects and charge
//! storage cost the way the real store's on-chain registration does.
//! Failure-injection knobs cover the orphaned-object and degraded-listing
//! paths.

use crate::ledger::InMemoryLedger;
use async_lock::RwLock;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use velum_core::{
    Address, BlobEffects, BlobUpload, ContentId, Encoding, LedgerEffects, ObjectId, StoredObject,
    VelumError, VelumResult,
};

/// Expansion factor applied by the store's erasure coding.
pub const ENCODING_FACTOR: u64 = 3;

#[derive(Debug, Default)]
struct BlobState {
    contents: HashMap<ContentId, Vec<u8>>,
    attributes: HashMap<ObjectId, BTreeMap<String, String>>,
    fail_next_attach: bool,
    failing_attribute_objects: HashSet<ObjectId>,
}

/// In-memory [`BlobEffects`] handler.
#[derive(Debug, Clone)]
pub struct InMemoryBlobStore {
    ledger: InMemoryLedger,
    state: Arc<RwLock<BlobState>>,
}

impl InMemoryBlobStore {
    /// Create a store registering objects on `ledger`.
    pub fn new(ledger: InMemoryLedger) -> Self {
        Self {
            ledger,
            state: Arc::new(RwLock::new(BlobState::default())),
        }
    }

    /// Make the next `attach_attributes` call fail, leaving its object
    /// stored but orphaned.
    pub async fn fail_next_attach(&self) {
        self.state.write().await.fail_next_attach = true;
    }

    /// Make attribute fetches for `object` fail until cleared, for
    /// degraded-listing tests.
    pub async fn fail_attributes_for(&self, object: ObjectId) {
        self.state
            .write()
            .await
            .failing_attribute_objects
            .insert(object);
    }

    /// Clear an attribute-fetch failure injection.
    pub async fn clear_attribute_failure(&self, object: ObjectId) {
        self.state
            .write()
            .await
            .failing_attribute_objects
            .remove(&object);
    }

    fn cost_for(encoded_size: u64, epochs: u64) -> u64 {
        1 + encoded_size * epochs / 100
    }
}

#[async_trait]
impl BlobEffects for InMemoryBlobStore {
    async fn upload(
        &self,
        owner: Address,
        bytes: Vec<u8>,
        epochs: u64,
        deletable: bool,
    ) -> VelumResult<BlobUpload> {
        let content_id = ContentId::for_bytes(&bytes);
        let unencoded_size = bytes.len() as u64;
        let encoded_size = unencoded_size * ENCODING_FACTOR;
        let cost = Self::cost_for(encoded_size, epochs);

        let epoch = self.ledger.current_epoch().await?;
        let object = StoredObject {
            object_id: ObjectId::from_bytes(rand::random()),
            content_id,
            unencoded_size,
            encoded_size,
            encoding: Encoding::ReedSolomon,
            start_epoch: epoch,
            end_epoch: epoch.plus(epochs),
            deletable,
        };
        let upload = BlobUpload {
            object_id: object.object_id,
            content_id,
            encoded_size,
            encoding: object.encoding,
            start_epoch: object.start_epoch,
            end_epoch: object.end_epoch,
            cost,
        };

        self.ledger.register_blob(owner, object, cost).await?;
        self.state.write().await.contents.insert(content_id, bytes);
        Ok(upload)
    }

    async fn download(&self, content_id: ContentId) -> VelumResult<Vec<u8>> {
        self.state
            .read()
            .await
            .contents
            .get(&content_id)
            .cloned()
            .ok_or_else(|| VelumError::not_found(format!("content {content_id}")))
    }

    async fn attach_attributes(
        &self,
        object: ObjectId,
        entries: BTreeMap<String, String>,
    ) -> VelumResult<()> {
        if !self.ledger.is_registered_blob(object).await {
            return Err(VelumError::not_found(format!("blob object {object}")));
        }
        let mut state = self.state.write().await;
        if state.fail_next_attach {
            state.fail_next_attach = false;
            return Err(VelumError::transaction_failure(
                "attribute transaction rejected",
            ));
        }
        state.attributes.entry(object).or_default().extend(entries);
        Ok(())
    }

    async fn attributes(&self, object: ObjectId) -> VelumResult<BTreeMap<String, String>> {
        if !self.ledger.is_registered_blob(object).await {
            return Err(VelumError::not_found(format!("blob object {object}")));
        }
        let state = self.state.read().await;
        if state.failing_attribute_objects.contains(&object) {
            return Err(VelumError::transaction_failure(
                "attribute fetch unavailable",
            ));
        }
        Ok(state.attributes.get(&object).cloned().unwrap_or_default())
    }

    async fn delete(&self, object: ObjectId) -> VelumResult<()> {
        let stored = self
            .ledger
            .blob(object)
            .await
            .ok_or_else(|| VelumError::not_found(format!("blob object {object}")))?;
        if !stored.deletable {
            return Err(VelumError::transaction_failure(format!(
                "blob object {object} is not deletable"
            )));
        }
        self.ledger.remove_blob(object).await?;
        self.state.write().await.attributes.remove(&object);
        // Content bytes stay behind until retention lapses, as in a real
        // content-addressed store; the object is gone from the owned set.
        Ok(())
    }
}
