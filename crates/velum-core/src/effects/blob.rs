//! Blob store effect trait

use crate::identifiers::{Address, ContentId, ObjectId};
use crate::types::BlobUpload;
use crate::VelumResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// The blob store collaborator: content-addressed upload/download with an
/// epoch-based retention window and a key/value attribute store per object.
#[async_trait]
pub trait BlobEffects: Send + Sync {
    /// Upload `bytes` on behalf of `owner`, requesting `epochs` of
    /// retention. Returns the new object's receipt; the content id is
    /// derived from the bytes and stable across re-uploads.
    async fn upload(
        &self,
        owner: Address,
        bytes: Vec<u8>,
        epochs: u64,
        deletable: bool,
    ) -> VelumResult<BlobUpload>;

    /// Download the bytes for a content id.
    async fn download(&self, content_id: ContentId) -> VelumResult<Vec<u8>>;

    /// Merge `entries` into the object's attribute map.
    async fn attach_attributes(
        &self,
        object: ObjectId,
        entries: BTreeMap<String, String>,
    ) -> VelumResult<()>;

    /// Fetch the object's full attribute map.
    async fn attributes(&self, object: ObjectId) -> VelumResult<BTreeMap<String, String>>;

    /// Delete a stored object. The object must be deletable.
    async fn delete(&self, object: ObjectId) -> VelumResult<()>;
}
