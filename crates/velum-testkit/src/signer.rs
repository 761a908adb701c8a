//! Ed25519 test signer

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use velum_core::{Address, SignerEffects, VelumResult};

/// In-memory [`SignerEffects`] handler around a generated or seeded
/// ed25519 key.
#[derive(Debug, Clone)]
pub struct TestSigner {
    key: SigningKey,
    address: Address,
}

impl TestSigner {
    /// Create a signer with a random key.
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Create a deterministic signer from a one-byte seed.
    pub fn from_seed(seed: u8) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&[seed; 32]))
    }

    fn from_signing_key(key: SigningKey) -> Self {
        let address = Address::from_public_key(&key.verifying_key().to_bytes());
        Self { key, address }
    }
}

#[async_trait]
impl SignerEffects for TestSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    async fn sign(&self, message: &[u8]) -> VelumResult<Vec<u8>> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    #[tokio::test]
    async fn signatures_verify_under_the_reported_key() {
        let signer = TestSigner::from_seed(7);
        let signature = signer.sign(b"message").await.unwrap();
        let key = ed25519_dalek::VerifyingKey::from_bytes(&signer.public_key()).unwrap();
        let signature = Signature::from_slice(&signature).unwrap();
        key.verify(b"message", &signature).unwrap();
    }

    #[test]
    fn address_is_stable_per_seed() {
        assert_eq!(
            TestSigner::from_seed(1).address(),
            TestSigner::from_seed(1).address()
        );
        assert_ne!(
            TestSigner::from_seed(1).address(),
            TestSigner::from_seed(2).address()
        );
    }
}
