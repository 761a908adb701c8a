//! In-memory threshold key-server cluster
//!
//! Stands in for the threshold encryption service. Per-identity keys are
//! derived from a cluster master seed with HKDF and sealed with
//! ChaCha20-Poly1305; the threshold itself is modeled as a configurable
//! responsive-server count so share-collection failures are exercisable.
//! Decryption re-checks authorization exactly as the real service would:
//! verify the session proof, then simulate the approval preview against
//! current ledger state before releasing anything.

use crate::ledger::InMemoryLedger;
use async_lock::RwLock;
use async_trait::async_trait;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hkdf::Hkdf;
use sha2::Sha256;
use std::sync::Arc;
use time::OffsetDateTime;
use velum_core::{
    Address, DecryptRequest, EncryptedPayload, SealEffects, VelumError, VelumResult, WhitelistId,
};

const NONCE_LEN: usize = 12;
const KEY_DERIVATION_SALT: &[u8] = b"velum-seal-v1";

/// In-memory [`SealEffects`] handler: an n-server cluster with a
/// controllable number of responsive servers.
#[derive(Debug, Clone)]
pub struct InMemorySealCluster {
    ledger: InMemoryLedger,
    master_seed: [u8; 32],
    servers: u8,
    responsive: Arc<RwLock<u8>>,
}

impl InMemorySealCluster {
    /// Create a three-server cluster, all responsive, keyed by a random
    /// master seed.
    pub fn new(ledger: InMemoryLedger) -> Self {
        Self::with_servers(ledger, 3)
    }

    /// Create a cluster with `servers` key servers, all responsive.
    pub fn with_servers(ledger: InMemoryLedger, servers: u8) -> Self {
        Self {
            ledger,
            master_seed: rand::random(),
            servers,
            responsive: Arc::new(RwLock::new(servers)),
        }
    }

    /// Total key servers in the cluster.
    pub fn servers(&self) -> u8 {
        self.servers
    }

    /// Set how many servers answer share requests. Dropping below the
    /// ciphertext threshold makes decryption fail with
    /// `InsufficientShares`.
    pub async fn set_responsive(&self, count: u8) {
        *self.responsive.write().await = count.min(self.servers);
    }

    fn derive_key(&self, identity: WhitelistId) -> Key {
        let hkdf = Hkdf::<Sha256>::new(Some(KEY_DERIVATION_SALT), &self.master_seed);
        let mut key = [0u8; 32];
        // 32 bytes is always a valid HKDF-SHA256 output length.
        hkdf.expand(identity.identity_bytes(), &mut key)
            .unwrap_or_else(|_| unreachable!("32-byte HKDF expansion cannot fail"));
        Key::from(key)
    }

    fn verify_proof(&self, request: &DecryptRequest, now: OffsetDateTime) -> VelumResult<()> {
        let proof = &request.proof;
        let whitelist = request.preview.whitelist;
        let denied = |address: Address| VelumError::AccessDenied { address, whitelist };

        // The proof must be bound to the address it claims.
        if Address::from_public_key(&proof.public_key) != proof.requester {
            return Err(denied(proof.requester));
        }
        let verifying_key = VerifyingKey::from_bytes(&proof.public_key)
            .map_err(|_| denied(proof.requester))?;
        let signature = Signature::from_slice(&proof.signature)
            .map_err(|_| denied(proof.requester))?;
        verifying_key
            .verify(&proof.message()?, &signature)
            .map_err(|_| denied(proof.requester))?;

        if proof.is_expired(now) {
            return Err(VelumError::ExpiredSessionProof {
                address: proof.requester,
                ttl_secs: proof.ttl_secs,
            });
        }

        // One proof authorizes exactly one package: the preview it signed
        // over, submitted by the address it asserts.
        if proof.preview_digest != request.preview.digest()?
            || request.preview.sender != proof.requester
        {
            return Err(denied(proof.requester));
        }
        Ok(())
    }
}

#[async_trait]
impl SealEffects for InMemorySealCluster {
    async fn encrypt(
        &self,
        identity: WhitelistId,
        threshold: u8,
        plaintext: &[u8],
    ) -> VelumResult<EncryptedPayload> {
        if threshold == 0 || threshold > self.servers {
            return Err(VelumError::encryption_failed(format!(
                "threshold {threshold} out of range for {} servers",
                self.servers
            )));
        }
        let responsive = *self.responsive.read().await;
        if responsive < threshold {
            return Err(VelumError::encryption_failed(format!(
                "only {responsive} of {} key servers reachable",
                self.servers
            )));
        }

        let cipher = ChaCha20Poly1305::new(&self.derive_key(identity));
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from(nonce_bytes);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VelumError::encryption_failed("sealing failed"))?;

        let mut bytes = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        bytes.extend_from_slice(&nonce_bytes);
        bytes.extend_from_slice(&ciphertext);
        Ok(EncryptedPayload {
            identity,
            threshold,
            bytes,
        })
    }

    async fn decrypt(&self, request: DecryptRequest) -> VelumResult<Vec<u8>> {
        let responsive = *self.responsive.read().await;
        if responsive < request.payload.threshold {
            return Err(VelumError::InsufficientShares {
                collected: responsive,
                threshold: request.payload.threshold,
            });
        }

        self.verify_proof(&request, OffsetDateTime::now_utc())?;

        let whitelist = request.preview.whitelist;
        let requester = request.preview.sender;
        if request.payload.identity != whitelist {
            return Err(VelumError::AccessDenied {
                address: requester,
                whitelist,
            });
        }

        // Simulate the approval preview against current ledger state.
        let members = self
            .ledger
            .members_snapshot(whitelist)
            .await
            .ok_or_else(|| VelumError::not_found(format!("whitelist {whitelist}")))?;
        if !members.contains(&requester) {
            return Err(VelumError::AccessDenied {
                address: requester,
                whitelist,
            });
        }

        if request.payload.bytes.len() < NONCE_LEN {
            return Err(VelumError::serialization("ciphertext shorter than nonce"));
        }
        let (nonce_bytes, ciphertext) = request.payload.bytes.split_at(NONCE_LEN);
        let nonce_bytes: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| VelumError::serialization("malformed nonce"))?;
        let cipher = ChaCha20Poly1305::new(&self.derive_key(whitelist));
        cipher
            .decrypt(&Nonce::from(nonce_bytes), ciphertext)
            .map_err(|_| VelumError::encryption_failed("ciphertext authentication failed"))
    }
}
