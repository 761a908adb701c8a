use assert_matches::assert_matches;
use std::collections::BTreeMap;
use std::sync::Arc;
use velum_core::{
    LedgerCall, LedgerEffects, SignerEffects, StoreReceipt, Transaction, VelumError,
};
use velum_policy::PolicyManager;
use velum_seal::SealCoordinator;
use velum_store::{AttributeIndex, BlobBridge};
use velum_testkit::{TestCluster, TestSigner};

type TestBridge = BlobBridge<
    velum_testkit::InMemoryLedger,
    velum_testkit::InMemorySealCluster,
    velum_testkit::InMemoryBlobStore,
    TestSigner,
>;

type TestTransfer =
    velum_transfer::TransferCoordinator<velum_testkit::InMemoryLedger, velum_testkit::InMemoryBlobStore>;

fn bridge_for(cluster: &TestCluster, signer: Arc<TestSigner>) -> TestBridge {
    let policy = PolicyManager::new(Arc::clone(&cluster.ledger), signer.address());
    let seal = SealCoordinator::new(policy, Arc::clone(&cluster.seal));
    BlobBridge::new(
        Arc::clone(&cluster.ledger),
        Arc::clone(&cluster.blob),
        seal,
        signer,
    )
}

fn transfer_for(cluster: &TestCluster, signer: &TestSigner) -> TestTransfer {
    let policy = PolicyManager::new(Arc::clone(&cluster.ledger), signer.address());
    let attributes = AttributeIndex::new(Arc::clone(&cluster.blob));
    velum_transfer::TransferCoordinator::new(Arc::clone(&cluster.ledger), policy, attributes)
}

async fn store_hello(bridge: &TestBridge) -> StoreReceipt {
    bridge
        .store(b"hello", 5, true, BTreeMap::new())
        .await
        .unwrap()
        .receipt()
        .unwrap()
        .clone()
}

#[tokio::test]
async fn send_enrolls_the_destination_in_the_whitelist() {
    let cluster = TestCluster::new().await;
    let sender_bridge = bridge_for(&cluster, Arc::clone(&cluster.signer));
    let receipt = store_hello(&sender_bridge).await;

    let recipient = cluster.funded_signer(2).await;
    let members_before = cluster
        .ledger
        .members_snapshot(receipt.policy.whitelist_id)
        .await
        .unwrap();
    assert!(!members_before.contains(&recipient.address()));

    transfer_for(&cluster, &cluster.signer)
        .send(receipt.object_id, recipient.address())
        .await
        .unwrap();

    let members_after = cluster
        .ledger
        .members_snapshot(receipt.policy.whitelist_id)
        .await
        .unwrap();
    assert!(members_after.contains(&recipient.address()));
}

#[tokio::test]
async fn transfer_preserves_access_for_both_parties() {
    let cluster = TestCluster::new().await;
    let sender_bridge = bridge_for(&cluster, Arc::clone(&cluster.signer));
    let receipt = store_hello(&sender_bridge).await;

    let recipient = cluster.funded_signer(2).await;
    transfer_for(&cluster, &cluster.signer)
        .send(receipt.object_id, recipient.address())
        .await
        .unwrap();

    // The recipient now owns the object and can read it end to end.
    let recipient_bridge = bridge_for(&cluster, Arc::clone(&recipient));
    assert_eq!(
        recipient_bridge.read(receipt.content_id).await.unwrap(),
        b"hello"
    );

    // The original owner's membership was not revoked.
    assert_eq!(
        sender_bridge.read(receipt.content_id).await.unwrap(),
        b"hello"
    );
}

#[tokio::test]
async fn ownership_and_cap_move_together() {
    let cluster = TestCluster::new().await;
    let sender_bridge = bridge_for(&cluster, Arc::clone(&cluster.signer));
    let receipt = store_hello(&sender_bridge).await;

    let recipient = cluster.funded_signer(2).await;
    transfer_for(&cluster, &cluster.signer)
        .send(receipt.object_id, recipient.address())
        .await
        .unwrap();

    assert_eq!(
        cluster.ledger.owner_of(receipt.object_id).await,
        Some(recipient.address())
    );
    assert_eq!(
        cluster
            .ledger
            .owner_of(receipt.policy.cap_id.object_id())
            .await,
        Some(recipient.address())
    );

    // The new cap holder can mutate the whitelist.
    let recipient_policy =
        PolicyManager::new(Arc::clone(&cluster.ledger), recipient.address());
    let third = TestSigner::from_seed(3).address();
    recipient_policy
        .add_members(receipt.policy.whitelist_id, receipt.policy.cap_id, &[third])
        .await
        .unwrap();
}

#[tokio::test]
async fn transferring_an_object_held_by_someone_else_fails() {
    let cluster = TestCluster::new().await;
    let sender_bridge = bridge_for(&cluster, Arc::clone(&cluster.signer));
    let receipt = store_hello(&sender_bridge).await;
    let recipient = cluster.funded_signer(2).await;

    // Move only the stored object away, keeping the cap: the subsequent
    // send passes the membership step but the transfer itself must fail.
    let effects = cluster
        .ledger
        .execute(Transaction::single(
            cluster.signer.address(),
            LedgerCall::TransferObject {
                object: receipt.object_id,
                recipient: recipient.address(),
            },
        ))
        .await
        .unwrap();
    assert!(effects.status.is_success());

    let result = transfer_for(&cluster, &cluster.signer)
        .send(receipt.object_id, TestSigner::from_seed(4).address())
        .await;
    assert_matches!(
        result,
        Err(VelumError::TransferFailed { object, .. }) if object == receipt.object_id
    );
}

#[tokio::test]
async fn send_without_the_cap_is_authorization_denied() {
    let cluster = TestCluster::new().await;
    let sender_bridge = bridge_for(&cluster, Arc::clone(&cluster.signer));
    let receipt = store_hello(&sender_bridge).await;

    let interloper = cluster.funded_signer(5).await;
    let result = transfer_for(&cluster, &interloper)
        .send(receipt.object_id, interloper.address())
        .await;
    assert_matches!(result, Err(VelumError::AuthorizationDenied { .. }));
}
