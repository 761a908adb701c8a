//! Effect trait definitions for the four external collaborators
//!
//! Pure trait definitions: the ledger client, the threshold encryption
//! service, the blob store, and the wallet/signer. This module defines
//! **what** each collaborator does; handlers (production adapters or the
//! deterministic in-memory ones in `velum-testkit`) define **how**.
//!
//! All operations are request/response and may block on network round
//! trips. Timeouts are inherited from the underlying clients; cancellation
//! is not exposed. This layer adds no locking of its own: the external
//! ledger serializes conflicting mutations.

mod blob;
mod ledger;
mod seal;
mod signer;

pub use blob::BlobEffects;
pub use ledger::LedgerEffects;
pub use seal::{DecryptRequest, SealEffects};
pub use signer::SignerEffects;
