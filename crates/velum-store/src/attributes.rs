//! Attribute index: the join between storage and policy
//!
//! Correlates a blob's object id with its access-control ids and user
//! metadata through the blob store's per-object attribute API.

use std::collections::BTreeMap;
use std::sync::Arc;
use velum_core::{
    BlobEffects, LinkageAttributes, ObjectId, PolicyPair, VelumError, VelumResult,
};

/// Reads and writes the attribute map of stored objects, keeping the
/// `capId`/`whitelistId` linkage authoritative.
pub struct AttributeIndex<B> {
    blob: Arc<B>,
}

impl<B> Clone for AttributeIndex<B> {
    fn clone(&self) -> Self {
        Self {
            blob: Arc::clone(&self.blob),
        }
    }
}

impl<B: BlobEffects> AttributeIndex<B> {
    /// Create an index over a blob store handle.
    pub fn new(blob: Arc<B>) -> Self {
        Self { blob }
    }

    /// Attach the policy linkage plus caller metadata to a fresh object.
    ///
    /// Linkage keys win over colliding user keys; the join must stay
    /// authoritative.
    pub async fn link(
        &self,
        object: ObjectId,
        policy: &PolicyPair,
        extra: BTreeMap<String, String>,
    ) -> VelumResult<()> {
        let mut entries = extra;
        entries.extend(LinkageAttributes::from_policy(policy).to_entries());
        self.blob.attach_attributes(object, entries).await
    }

    /// Resolve the access-control linkage of an object.
    ///
    /// Fails with `LinkageMissing` when the object exists but carries no
    /// recorded linkage (the orphaned state).
    pub async fn resolve(&self, object: ObjectId) -> VelumResult<LinkageAttributes> {
        let entries = self.blob.attributes(object).await?;
        LinkageAttributes::from_entries(&entries)?
            .ok_or(VelumError::LinkageMissing { object })
    }

    /// Fetch an object's full attribute map.
    pub async fn get(&self, object: ObjectId) -> VelumResult<BTreeMap<String, String>> {
        self.blob.attributes(object).await
    }

    /// Merge user metadata into an object's attribute map.
    pub async fn add(
        &self,
        object: ObjectId,
        entries: BTreeMap<String, String>,
    ) -> VelumResult<()> {
        self.blob.attach_attributes(object, entries).await
    }
}
