//! # Velum Policy
//!
//! Whitelist/cap lifecycle: create a policy pair, add and remove members
//! under cap authority, and enumerate members through a read-only ledger
//! simulation.
//!
//! Policy mutations are modeled as idempotent commands against the external
//! system of record. The ledger serializes conflicting mutations; this
//! crate adds no locking of its own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod manager;
mod members;

pub use manager::PolicyManager;
pub use members::{decode_member_payload, encode_member_payload};
