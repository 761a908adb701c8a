//! Threshold encryption service effect trait

use crate::identifiers::WhitelistId;
use crate::types::{ApprovalPreview, EncryptedPayload, SessionProof};
use crate::VelumResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One decrypt attempt handed to the threshold encryption service:
/// ciphertext, a short-lived session proof, and the approval preview the
/// service simulates against current ledger state before releasing shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Ciphertext bound to its whitelist identity
    pub payload: EncryptedPayload,
    /// Signed, TTL-bounded requester assertion
    pub proof: SessionProof,
    /// Unexecuted approval transaction for the service to simulate
    pub preview: ApprovalPreview,
}

/// The threshold encryption collaborator: encrypts under an identity string
/// against a fixed threshold of key servers, and decrypts given a valid
/// session proof.
///
/// The service independently re-checks authorization by simulating the
/// request's preview before releasing key shares; this layer never sees
/// shares or key material.
#[async_trait]
pub trait SealEffects: Send + Sync {
    /// Encrypt `plaintext` under `identity`, requiring `threshold`-of-n key
    /// servers to cooperate for decryption.
    async fn encrypt(
        &self,
        identity: WhitelistId,
        threshold: u8,
        plaintext: &[u8],
    ) -> VelumResult<EncryptedPayload>;

    /// Attempt one decryption. Fails with `AccessDenied` when the simulated
    /// preview shows the requester is not a current member,
    /// `InsufficientShares` when fewer than `threshold` servers respond,
    /// and `ExpiredSessionProof` when the proof's TTL elapses first.
    async fn decrypt(&self, request: DecryptRequest) -> VelumResult<Vec<u8>>;
}
