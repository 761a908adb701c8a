//! # Velum Testkit
//!
//! Deterministic in-memory handlers for the four collaborator effect
//! traits: a mock ledger, a mock threshold key-server cluster, a mock
//! content-addressed blob store, and an ed25519 test signer, plus a
//! [`TestCluster`] fixture wiring them together with a funded wallet.
//!
//! The handlers implement the real contracts faithfully enough to exercise
//! every documented failure mode: cap mismatches, unknown objects, gas and
//! storage shortfalls, unresponsive key servers, expired session proofs,
//! and injected attribute-store failures for orphaned-object testing.

#![forbid(unsafe_code)]

mod blob;
mod fixtures;
mod ledger;
mod seal;
mod signer;

pub use blob::{InMemoryBlobStore, ENCODING_FACTOR};
pub use fixtures::{init_tracing, TestCluster, DEFAULT_PRIMARY_FUNDS, DEFAULT_STORAGE_FUNDS};
pub use ledger::{InMemoryLedger, GAS_FEE};
pub use seal::InMemorySealCluster;
pub use signer::TestSigner;
