//! Ledger client effect trait

use crate::identifiers::{Address, Epoch};
use crate::ledger::{LedgerQuery, Transaction, TransactionDigest, TransactionEffects};
use crate::types::{StoredObject, WalletBalance};
use crate::VelumResult;
use async_trait::async_trait;

/// The ledger collaborator: submits signed transactions, runs read-only
/// simulations, and answers object/balance queries.
///
/// Signing is the handler's concern; this layer hands over a typed
/// [`Transaction`] and the handler's wallet produces the signature.
#[async_trait]
pub trait LedgerEffects: Send + Sync {
    /// Submit a transaction and wait for its effect record.
    ///
    /// A ledger-side revert comes back as `Ok` with a failure status so the
    /// typed fault is preserved; `Err` means the submission itself failed.
    async fn execute(&self, tx: Transaction) -> VelumResult<TransactionEffects>;

    /// Run a read-only simulation. No fee, no state mutation. Returns the
    /// raw binary payload of the invoked getter.
    async fn inspect(&self, query: LedgerQuery) -> VelumResult<Vec<u8>>;

    /// Enumerate the stored-blob objects owned by `owner`.
    async fn owned_objects(&self, owner: Address) -> VelumResult<Vec<StoredObject>>;

    /// Wallet balances for the pre-flight funds check.
    async fn balance(&self, owner: Address) -> VelumResult<WalletBalance>;

    /// The blob store's current retention epoch as the ledger records it.
    async fn current_epoch(&self) -> VelumResult<Epoch>;

    /// Block until the given transaction is final. Replaces the fixed
    /// settling delay older designs used between dependent transactions.
    async fn await_finality(&self, digest: TransactionDigest) -> VelumResult<()>;
}
