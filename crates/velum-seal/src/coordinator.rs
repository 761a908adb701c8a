//! Encrypt/decrypt coordination over the threshold encryption service

use crate::proof::{build_session_proof, DecryptPhase};
use std::sync::Arc;
use tracing::{debug, info, warn};
use velum_core::{
    Address, ApprovalPreview, DecryptRequest, EncryptedPayload, LedgerEffects, PolicyPair,
    SealEffects, SignerEffects, VelumError, VelumResult, WhitelistId,
};
use velum_policy::PolicyManager;

/// Fixed threshold `t`: how many of the n key servers must cooperate to
/// decrypt.
pub const DEFAULT_THRESHOLD: u8 = 2;

/// Default session proof time-to-live, in seconds.
pub const DEFAULT_PROOF_TTL_SECS: u64 = 10 * 60;

/// Coordinates encryption and decryption against the threshold encryption
/// service, deriving the encryption identity from a freshly created policy.
pub struct SealCoordinator<L, E> {
    policy: PolicyManager<L>,
    seal: Arc<E>,
    threshold: u8,
    proof_ttl_secs: u64,
}

impl<L, E> Clone for SealCoordinator<L, E> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            seal: Arc::clone(&self.seal),
            threshold: self.threshold,
            proof_ttl_secs: self.proof_ttl_secs,
        }
    }
}

impl<L: LedgerEffects, E: SealEffects> SealCoordinator<L, E> {
    /// Create a coordinator with the default threshold and proof TTL.
    pub fn new(policy: PolicyManager<L>, seal: Arc<E>) -> Self {
        Self {
            policy,
            seal,
            threshold: DEFAULT_THRESHOLD,
            proof_ttl_secs: DEFAULT_PROOF_TTL_SECS,
        }
    }

    /// Override the decryption threshold.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Override the session proof time-to-live.
    pub fn with_proof_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.proof_ttl_secs = ttl_secs;
        self
    }

    /// The policy manager this coordinator creates policies through.
    pub fn policy_manager(&self) -> &PolicyManager<L> {
        &self.policy
    }

    /// Encrypt `plaintext` under a freshly created policy.
    ///
    /// Creates the whitelist/cap pair, enrolls `self_address` so the
    /// creator can always decrypt their own data, then encrypts under
    /// identity = whitelist id with the fixed threshold.
    pub async fn encode(
        &self,
        plaintext: &[u8],
        self_address: Address,
    ) -> VelumResult<(EncryptedPayload, PolicyPair)> {
        let policy = self
            .policy
            .create_policy()
            .await
            .map_err(|e| VelumError::policy_creation_failed(e.to_string()))?;
        self.policy
            .add_members(policy.whitelist_id, policy.cap_id, &[self_address])
            .await
            .map_err(|e| {
                VelumError::policy_creation_failed(format!(
                    "failed to enroll creator {self_address}: {e}"
                ))
            })?;

        let payload = self
            .seal
            .encrypt(policy.whitelist_id, self.threshold, plaintext)
            .await
            .map_err(|e| match e {
                already @ VelumError::EncryptionFailed { .. } => already,
                other => VelumError::encryption_failed(other.to_string()),
            })?;

        info!(
            identity = %policy.whitelist_id,
            threshold = self.threshold,
            plaintext_len = plaintext.len(),
            ciphertext_len = payload.len(),
            "encrypted payload under new policy"
        );
        Ok((payload, policy))
    }

    /// Decrypt `payload` as the holder of `signer`'s key.
    ///
    /// Builds the unexecuted approval preview for `whitelist`, signs a
    /// TTL-bounded session proof, and submits both with the ciphertext. The
    /// service re-checks authorization by simulating the preview against
    /// current ledger state before releasing shares.
    pub async fn decode<S: SignerEffects>(
        &self,
        payload: EncryptedPayload,
        whitelist: WhitelistId,
        signer: &S,
    ) -> VelumResult<Vec<u8>> {
        let requester = signer.address();
        debug!(%whitelist, %requester, phase = %DecryptPhase::Requested, "decrypt attempt");

        let preview = ApprovalPreview::new(requester, whitelist);
        let proof = build_session_proof(signer, &preview, self.proof_ttl_secs).await?;
        debug!(%whitelist, %requester, phase = %DecryptPhase::ProofBuilt, "decrypt attempt");

        debug!(%whitelist, %requester, phase = %DecryptPhase::SharesCollecting, "decrypt attempt");
        let result = self
            .seal
            .decrypt(DecryptRequest {
                payload,
                proof,
                preview,
            })
            .await;

        let terminal = DecryptPhase::terminal(&result);
        match &result {
            Ok(plaintext) => {
                info!(%whitelist, %requester, phase = %terminal, plaintext_len = plaintext.len(), "decrypt attempt finished");
            }
            Err(error) => {
                warn!(%whitelist, %requester, phase = %terminal, %error, "decrypt attempt failed");
            }
        }
        result
    }
}
