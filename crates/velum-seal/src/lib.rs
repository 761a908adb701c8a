//! # Velum Seal
//!
//! Encryption coordination: derives the encryption identity from a policy,
//! drives encrypt/decrypt through the threshold encryption service, and
//! builds the session proofs that authorize decryption.
//!
//! Encrypting creates a fresh whitelist/cap pair and enrolls the creator so
//! they can always decrypt their own data. Decrypting builds an unexecuted
//! approval preview plus a TTL-bounded signed session proof; the service
//! simulates the preview against current ledger state before releasing key
//! shares.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod coordinator;
mod proof;

pub use coordinator::{SealCoordinator, DEFAULT_PROOF_TTL_SECS, DEFAULT_THRESHOLD};
pub use proof::{build_session_proof, build_session_proof_at, DecryptPhase};
