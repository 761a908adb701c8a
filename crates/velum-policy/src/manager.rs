//! Policy manager: whitelist/cap lifecycle over the ledger

use crate::members::decode_member_payload;
use std::sync::Arc;
use tracing::{debug, info};
use velum_core::{
    Address, CapId, LedgerCall, LedgerEffects, LedgerFault, LedgerQuery, ObjectKind, PolicyPair,
    Transaction, TransactionDigest, TransactionEffects, VelumError, VelumResult, WhitelistId,
};

/// Owns the whitelist/cap lifecycle for one sending address.
///
/// Each operation issues a single batched ledger transaction (or a
/// read-only simulation for [`PolicyManager::members`]) and maps the typed
/// ledger fault into the Velum error taxonomy at the boundary.
pub struct PolicyManager<L> {
    ledger: Arc<L>,
    sender: Address,
}

impl<L> Clone for PolicyManager<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            sender: self.sender,
        }
    }
}

impl<L: LedgerEffects> PolicyManager<L> {
    /// Create a manager submitting transactions as `sender`.
    pub fn new(ledger: Arc<L>, sender: Address) -> Self {
        Self { ledger, sender }
    }

    /// The address this manager submits as.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Create a whitelist and its cap atomically in one transaction.
    ///
    /// The new ids are extracted from the transaction's effect record by
    /// object kind. A successful transaction whose effects lack either kind
    /// indicates a contract/ABI mismatch and fails with `LinkageNotFound`.
    pub async fn create_policy(&self) -> VelumResult<PolicyPair> {
        let tx = Transaction::single(self.sender, LedgerCall::CreatePolicy);
        let effects = self.require_success(self.ledger.execute(tx).await?)?;

        let whitelist = effects.created_of_kind(ObjectKind::Whitelist);
        let cap = effects.created_of_kind(ObjectKind::Cap);
        match (whitelist, cap) {
            (Some(whitelist), Some(cap)) => {
                let policy = PolicyPair {
                    whitelist_id: WhitelistId::new(whitelist),
                    cap_id: CapId::new(cap),
                };
                info!(whitelist = %policy.whitelist_id, cap = %policy.cap_id, "created policy");
                Ok(policy)
            }
            _ => Err(VelumError::LinkageNotFound {
                digest: effects.digest.to_string(),
            }),
        }
    }

    /// Add `members` to a whitelist under `cap` authority.
    ///
    /// One call is issued per address inside a single batched transaction.
    /// Duplicate members are benign no-ops: the system of record keeps
    /// membership unique, and this layer does not pre-deduplicate.
    ///
    /// Returns the transaction digest so dependent operations can wait for
    /// finality.
    pub async fn add_members(
        &self,
        whitelist: WhitelistId,
        cap: CapId,
        members: &[Address],
    ) -> VelumResult<TransactionDigest> {
        self.mutate_members(whitelist, cap, members, true).await
    }

    /// Remove `members` from a whitelist under `cap` authority.
    pub async fn remove_members(
        &self,
        whitelist: WhitelistId,
        cap: CapId,
        members: &[Address],
    ) -> VelumResult<TransactionDigest> {
        self.mutate_members(whitelist, cap, members, false).await
    }

    /// Enumerate the current members of a whitelist.
    ///
    /// A read-only simulation: no transaction fee, no state mutation. The
    /// getter's binary payload is a u32 little-endian count followed by
    /// that many 32-byte addresses. An existing but empty whitelist yields
    /// an empty list; an unresolvable id fails with `NotFound`.
    pub async fn members(&self, whitelist: WhitelistId) -> VelumResult<Vec<Address>> {
        let payload = self
            .ledger
            .inspect(LedgerQuery::WhitelistMembers { whitelist })
            .await?;
        let members = decode_member_payload(&payload)?;
        debug!(%whitelist, count = members.len(), "enumerated whitelist members");
        Ok(members)
    }

    async fn mutate_members(
        &self,
        whitelist: WhitelistId,
        cap: CapId,
        members: &[Address],
        add: bool,
    ) -> VelumResult<TransactionDigest> {
        let calls = members
            .iter()
            .map(|&member| {
                if add {
                    LedgerCall::AddMember {
                        whitelist,
                        cap,
                        member,
                    }
                } else {
                    LedgerCall::RemoveMember {
                        whitelist,
                        cap,
                        member,
                    }
                }
            })
            .collect();
        let effects = self
            .require_success(self.ledger.execute(Transaction::new(self.sender, calls)).await?)?;
        info!(
            %whitelist,
            count = members.len(),
            op = if add { "add" } else { "remove" },
            "mutated whitelist membership"
        );
        Ok(effects.digest)
    }

    fn require_success(&self, effects: TransactionEffects) -> VelumResult<TransactionEffects> {
        if let velum_core::ExecutionStatus::Failure { fault } = &effects.status {
            return Err(match fault {
                LedgerFault::CapMismatch { cap, whitelist } => VelumError::AuthorizationDenied {
                    cap: *cap,
                    whitelist: *whitelist,
                },
                LedgerFault::UnknownObject { id } => VelumError::not_found(id.clone()),
                LedgerFault::InsufficientGas => {
                    VelumError::transaction_failure("insufficient gas")
                }
                LedgerFault::Aborted { message } => {
                    VelumError::transaction_failure(message.clone())
                }
            });
        }
        Ok(effects)
    }
}
