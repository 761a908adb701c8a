//! # Velum Transfer
//!
//! Reassigns ownership of a stored object together with its cap,
//! pre-authorizing the new owner: the recipient is added to the object's
//! whitelist before the transfer so decrypt capability survives the
//! ownership change. The sender's own membership is not revoked; this
//! protocol grants access, it does not implement exclusive handoff.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod coordinator;

pub use coordinator::TransferCoordinator;
