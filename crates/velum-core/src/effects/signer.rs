//! Wallet/signer effect trait

use crate::identifiers::Address;
use crate::VelumResult;
use async_trait::async_trait;

/// The wallet collaborator: holds keys and produces signatures.
///
/// Key generation and configuration management are out of scope; a handler
/// is constructed around existing key material.
#[async_trait]
pub trait SignerEffects: Send + Sync {
    /// The address derived from this signer's public key.
    fn address(&self) -> Address;

    /// The ed25519 public key, for embedding in session proofs.
    fn public_key(&self) -> [u8; 32];

    /// Sign `message` with the held key.
    async fn sign(&self, message: &[u8]) -> VelumResult<Vec<u8>>;
}
