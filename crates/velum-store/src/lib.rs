//! # Velum Store
//!
//! Orchestration between the blob store, the policy layer, and the
//! encryption coordinator: `store` runs encrypt→upload→attribute-link and
//! owns the partial-failure state (an upload that succeeds but never gets
//! its linkage is stored-but-orphaned, surfaced as a tagged outcome, never
//! rolled back automatically); `read` runs resolve→download→decrypt;
//! `list` enumerates owned objects with per-item attribute degradation;
//! `burn` deletes stored objects (policy objects are never deleted).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attributes;
mod bridge;

pub use attributes::AttributeIndex;
pub use bridge::{BlobBridge, BurnReport, EPOCH_DURATION};
