//! Wired-together fixture for integration tests

use crate::{InMemoryBlobStore, InMemoryLedger, InMemorySealCluster, TestSigner};
use std::sync::{Arc, Once};
use velum_core::{Address, SignerEffects};

static TRACING: Once = Once::new();

/// Install a fmt subscriber honoring `RUST_LOG`, once per process.
/// Call at the top of a test to see operation-boundary tracing.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Default primary-asset funding for fixture wallets.
pub const DEFAULT_PRIMARY_FUNDS: u64 = 1_000_000;

/// Default storage-asset funding for fixture wallets.
pub const DEFAULT_STORAGE_FUNDS: u64 = 1_000_000;

/// A fully wired collaborator set: shared ledger, blob store and seal
/// cluster over it, and a funded signer.
#[derive(Clone)]
pub struct TestCluster {
    /// Shared in-memory ledger
    pub ledger: Arc<InMemoryLedger>,
    /// Blob store registering on the ledger
    pub blob: Arc<InMemoryBlobStore>,
    /// Threshold key-server cluster simulating against the ledger
    pub seal: Arc<InMemorySealCluster>,
    /// Funded test signer
    pub signer: Arc<TestSigner>,
}

impl TestCluster {
    /// Build a cluster with a deterministic, funded signer.
    pub async fn new() -> Self {
        Self::with_signer(TestSigner::from_seed(1)).await
    }

    /// Build a cluster around a specific signer, funding its wallet.
    pub async fn with_signer(signer: TestSigner) -> Self {
        let ledger = InMemoryLedger::new();
        let blob = InMemoryBlobStore::new(ledger.clone());
        let seal = InMemorySealCluster::new(ledger.clone());
        ledger
            .credit(
                signer.address(),
                DEFAULT_PRIMARY_FUNDS,
                DEFAULT_STORAGE_FUNDS,
            )
            .await;
        Self {
            ledger: Arc::new(ledger),
            blob: Arc::new(blob),
            seal: Arc::new(seal),
            signer: Arc::new(signer),
        }
    }

    /// Create and fund another wallet on the same ledger.
    pub async fn funded_signer(&self, seed: u8) -> Arc<TestSigner> {
        let signer = TestSigner::from_seed(seed);
        self.fund(signer.address(), DEFAULT_PRIMARY_FUNDS, DEFAULT_STORAGE_FUNDS)
            .await;
        Arc::new(signer)
    }

    /// Credit an arbitrary wallet.
    pub async fn fund(&self, address: Address, primary: u64, storage: u64) {
        self.ledger.credit(address, primary, storage).await;
    }
}
