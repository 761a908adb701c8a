//! In-memory ledger handler
//!
//! Models the on-chain state the coordination layer depends on: whitelists
//! and their caps, stored-blob ownership, wallet balances, and the blob
//! store's epoch counter. Transactions apply atomically; a typed fault
//! rolls back the whole batch.

use async_lock::RwLock;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use velum_core::{
    Address, CapId, CreatedObject, Epoch, ExecutionStatus, LedgerCall, LedgerEffects, LedgerFault,
    LedgerQuery, ObjectId, ObjectKind, StoredObject, Transaction, TransactionDigest,
    TransactionEffects, VelumError, VelumResult, WalletBalance, WhitelistId,
};
use velum_policy::encode_member_payload;

/// Flat fee charged per transaction, in the primary asset.
pub const GAS_FEE: u64 = 10;

#[derive(Debug, Default, Clone)]
struct LedgerState {
    whitelists: HashMap<WhitelistId, Vec<Address>>,
    caps: HashMap<CapId, WhitelistId>,
    owners: HashMap<ObjectId, Address>,
    blobs: HashMap<ObjectId, StoredObject>,
    balances: HashMap<Address, WalletBalance>,
    epoch: Epoch,
    executed: HashSet<TransactionDigest>,
    nonce: u64,
    drop_created_kind: Option<ObjectKind>,
}

/// In-memory [`LedgerEffects`] handler.
///
/// Cloning shares the underlying state, so the blob store and seal cluster
/// handlers can observe the same chain.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// Create an empty ledger at epoch zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a wallet with primary and storage balances.
    pub async fn credit(&self, owner: Address, primary: u64, storage: u64) {
        let mut state = self.state.write().await;
        let balance = state.balances.entry(owner).or_default();
        balance.primary += primary;
        balance.storage += storage;
    }

    /// Advance the retention epoch counter by `count`.
    pub async fn advance_epochs(&self, count: u64) {
        let mut state = self.state.write().await;
        state.epoch = state.epoch.plus(count);
    }

    /// Current members of a whitelist, or `None` if it does not exist.
    /// Used by the seal cluster to simulate approval previews.
    pub async fn members_snapshot(&self, whitelist: WhitelistId) -> Option<Vec<Address>> {
        self.state.read().await.whitelists.get(&whitelist).cloned()
    }

    /// Current owner of an object, if it exists.
    pub async fn owner_of(&self, object: ObjectId) -> Option<Address> {
        self.state.read().await.owners.get(&object).copied()
    }

    /// Whitelist a cap controls, if the cap exists.
    pub async fn cap_target(&self, cap: CapId) -> Option<WhitelistId> {
        self.state.read().await.caps.get(&cap).copied()
    }

    /// Omit created objects of `kind` from the next successful effect
    /// record, simulating a contract whose effects lack an expected
    /// object.
    pub async fn drop_created_of_kind_once(&self, kind: ObjectKind) {
        self.state.write().await.drop_created_kind = Some(kind);
    }

    /// Register a freshly uploaded blob object and charge its storage cost.
    /// Called by the blob store handler, mirroring on-chain registration.
    pub(crate) async fn register_blob(
        &self,
        owner: Address,
        object: StoredObject,
        cost: u64,
    ) -> VelumResult<()> {
        let mut state = self.state.write().await;
        let balance = state.balances.entry(owner).or_default();
        if balance.storage < cost {
            return Err(VelumError::InsufficientFunds {
                coin: "storage".to_string(),
                available: balance.storage,
            });
        }
        balance.storage -= cost;
        state.owners.insert(object.object_id, owner);
        state.blobs.insert(object.object_id, object);
        Ok(())
    }

    /// Deregister a deleted blob object.
    pub(crate) async fn remove_blob(&self, object: ObjectId) -> VelumResult<StoredObject> {
        let mut state = self.state.write().await;
        let removed = state
            .blobs
            .remove(&object)
            .ok_or_else(|| VelumError::not_found(format!("blob object {object}")))?;
        state.owners.remove(&object);
        Ok(removed)
    }

    /// Whether an object id is a registered blob.
    pub(crate) async fn is_registered_blob(&self, object: ObjectId) -> bool {
        self.state.read().await.blobs.contains_key(&object)
    }

    /// Metadata for a registered blob object.
    pub(crate) async fn blob(&self, object: ObjectId) -> Option<StoredObject> {
        self.state.read().await.blobs.get(&object).cloned()
    }

    fn fresh_object_id() -> ObjectId {
        ObjectId::from_bytes(rand::random())
    }

    fn digest_for(tx: &Transaction, nonce: u64) -> TransactionDigest {
        let mut bytes = bincode::serialize(tx).unwrap_or_default();
        bytes.extend_from_slice(&nonce.to_le_bytes());
        TransactionDigest::from_bytes(*blake3::hash(&bytes).as_bytes())
    }

    fn apply_call(
        state: &mut LedgerState,
        sender: Address,
        call: &LedgerCall,
        created: &mut Vec<CreatedObject>,
    ) -> Result<(), LedgerFault> {
        match call {
            LedgerCall::CreatePolicy => {
                let whitelist = WhitelistId::new(Self::fresh_object_id());
                let cap = CapId::new(Self::fresh_object_id());
                state.whitelists.insert(whitelist, Vec::new());
                state.caps.insert(cap, whitelist);
                state.owners.insert(cap.object_id(), sender);
                created.push(CreatedObject {
                    id: whitelist.object_id(),
                    kind: ObjectKind::Whitelist,
                });
                created.push(CreatedObject {
                    id: cap.object_id(),
                    kind: ObjectKind::Cap,
                });
                Ok(())
            }
            LedgerCall::AddMember {
                whitelist,
                cap,
                member,
            } => {
                Self::check_cap(state, sender, *cap, *whitelist)?;
                let members = state
                    .whitelists
                    .get_mut(whitelist)
                    .ok_or(LedgerFault::UnknownObject {
                        id: whitelist.to_string(),
                    })?;
                // Duplicate insertion is a benign no-op.
                if !members.contains(member) {
                    members.push(*member);
                }
                Ok(())
            }
            LedgerCall::RemoveMember {
                whitelist,
                cap,
                member,
            } => {
                Self::check_cap(state, sender, *cap, *whitelist)?;
                let members = state
                    .whitelists
                    .get_mut(whitelist)
                    .ok_or(LedgerFault::UnknownObject {
                        id: whitelist.to_string(),
                    })?;
                members.retain(|existing| existing != member);
                Ok(())
            }
            LedgerCall::TransferObject { object, recipient } => {
                let owner = state.owners.get_mut(object).ok_or(LedgerFault::UnknownObject {
                    id: object.to_string(),
                })?;
                if *owner != sender {
                    return Err(LedgerFault::Aborted {
                        message: format!("object {object} is not owned by {sender}"),
                    });
                }
                *owner = *recipient;
                Ok(())
            }
        }
    }

    fn check_cap(
        state: &LedgerState,
        sender: Address,
        cap: CapId,
        whitelist: WhitelistId,
    ) -> Result<(), LedgerFault> {
        let mismatch = LedgerFault::CapMismatch { cap, whitelist };
        match state.caps.get(&cap) {
            Some(controlled) if *controlled == whitelist => {}
            _ => return Err(mismatch),
        }
        // The sender must actually hold the cap.
        match state.owners.get(&cap.object_id()) {
            Some(owner) if *owner == sender => Ok(()),
            _ => Err(mismatch),
        }
    }
}

#[async_trait]
impl LedgerEffects for InMemoryLedger {
    async fn execute(&self, tx: Transaction) -> VelumResult<TransactionEffects> {
        let mut state = self.state.write().await;
        state.nonce += 1;
        let digest = Self::digest_for(&tx, state.nonce);
        state.executed.insert(digest);

        let fee_ok = {
            let balance = state.balances.entry(tx.sender).or_default();
            if balance.primary < GAS_FEE {
                false
            } else {
                balance.primary -= GAS_FEE;
                true
            }
        };
        if !fee_ok {
            return Ok(TransactionEffects {
                digest,
                status: ExecutionStatus::Failure {
                    fault: LedgerFault::InsufficientGas,
                },
                created: Vec::new(),
            });
        }

        // Stage against a scratch copy so a mid-batch fault rolls the whole
        // transaction back.
        let mut scratch = state.clone();
        let mut created = Vec::new();
        for call in &tx.calls {
            if let Err(fault) = Self::apply_call(&mut scratch, tx.sender, call, &mut created) {
                return Ok(TransactionEffects {
                    digest,
                    status: ExecutionStatus::Failure { fault },
                    created: Vec::new(),
                });
            }
        }
        *state = scratch;
        if let Some(kind) = state.drop_created_kind.take() {
            created.retain(|object| object.kind != kind);
        }
        Ok(TransactionEffects {
            digest,
            status: ExecutionStatus::Success,
            created,
        })
    }

    async fn inspect(&self, query: LedgerQuery) -> VelumResult<Vec<u8>> {
        match query {
            LedgerQuery::WhitelistMembers { whitelist } => {
                let state = self.state.read().await;
                let members = state
                    .whitelists
                    .get(&whitelist)
                    .ok_or_else(|| VelumError::not_found(format!("whitelist {whitelist}")))?;
                Ok(encode_member_payload(members))
            }
        }
    }

    async fn owned_objects(&self, owner: Address) -> VelumResult<Vec<StoredObject>> {
        let state = self.state.read().await;
        let mut objects: Vec<StoredObject> = state
            .blobs
            .values()
            .filter(|object| state.owners.get(&object.object_id) == Some(&owner))
            .cloned()
            .collect();
        objects.sort_by_key(|object| object.object_id);
        Ok(objects)
    }

    async fn balance(&self, owner: Address) -> VelumResult<WalletBalance> {
        let state = self.state.read().await;
        Ok(state.balances.get(&owner).copied().unwrap_or_default())
    }

    async fn current_epoch(&self) -> VelumResult<Epoch> {
        Ok(self.state.read().await.epoch)
    }

    async fn await_finality(&self, digest: TransactionDigest) -> VelumResult<()> {
        // Execution is synchronous here, so finality is just "was executed".
        let state = self.state.read().await;
        if state.executed.contains(&digest) {
            Ok(())
        } else {
            Err(VelumError::not_found(format!("transaction {digest}")))
        }
    }
}
