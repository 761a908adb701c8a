//! Transfer coordination

use std::sync::Arc;
use tracing::info;
use velum_core::{
    Address, BlobEffects, ExecutionStatus, LedgerCall, LedgerEffects, ObjectId, Transaction,
    VelumError, VelumResult,
};
use velum_policy::PolicyManager;
use velum_store::AttributeIndex;

/// Reassigns a stored object and its cap to a new owner.
pub struct TransferCoordinator<L, B> {
    ledger: Arc<L>,
    policy: PolicyManager<L>,
    attributes: AttributeIndex<B>,
}

impl<L, B> TransferCoordinator<L, B>
where
    L: LedgerEffects,
    B: BlobEffects,
{
    /// Wire a coordinator over the ledger and attribute index. Transfers
    /// are submitted as the policy manager's sender.
    pub fn new(ledger: Arc<L>, policy: PolicyManager<L>, attributes: AttributeIndex<B>) -> Self {
        Self {
            ledger,
            policy,
            attributes,
        }
    }

    /// Transfer `object` (and the cap recorded in its linkage) to
    /// `destination`.
    ///
    /// The destination is added to the object's whitelist **before**
    /// ownership moves, so the recipient retains decrypt capability after
    /// the transfer; the membership transaction is then waited to finality
    /// so the two transactions cannot land out of order. Finally one
    /// atomic ledger transaction moves the stored object and the cap
    /// together, verified through its effect status.
    pub async fn send(&self, object: ObjectId, destination: Address) -> VelumResult<()> {
        let linkage = self.attributes.resolve(object).await?;

        let membership = self
            .policy
            .add_members(linkage.whitelist_id, linkage.cap_id, &[destination])
            .await?;
        self.ledger.await_finality(membership).await?;

        let tx = Transaction::new(
            self.policy.sender(),
            vec![
                LedgerCall::TransferObject {
                    object,
                    recipient: destination,
                },
                LedgerCall::TransferObject {
                    object: linkage.cap_id.object_id(),
                    recipient: destination,
                },
            ],
        );
        let effects = self.ledger.execute(tx).await?;
        match effects.status {
            ExecutionStatus::Success => {
                info!(
                    %object,
                    cap = %linkage.cap_id,
                    whitelist = %linkage.whitelist_id,
                    %destination,
                    "transferred object and cap"
                );
                Ok(())
            }
            ExecutionStatus::Failure { fault } => Err(VelumError::TransferFailed {
                object,
                message: fault.to_string(),
            }),
        }
    }
}
