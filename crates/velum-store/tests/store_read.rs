use assert_matches::assert_matches;
use std::collections::BTreeMap;
use std::sync::Arc;
use velum_core::{
    BurnSelector, SignerEffects, StoreOutcome, VelumError, ATTR_CAP_ID, ATTR_WHITELIST_ID,
};
use velum_policy::PolicyManager;
use velum_seal::SealCoordinator;
use velum_store::BlobBridge;
use velum_testkit::{TestCluster, TestSigner};

type TestBridge = BlobBridge<
    velum_testkit::InMemoryLedger,
    velum_testkit::InMemorySealCluster,
    velum_testkit::InMemoryBlobStore,
    TestSigner,
>;

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

fn bridge(cluster: &TestCluster) -> TestBridge {
    bridge_for(cluster, Arc::clone(&cluster.signer))
}

#[tokio::test]
async fn store_then_read_roundtrips_hello() {
    velum_testkit::init_tracing();
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let outcome = bridge
        .store(b"hello", 5, true, BTreeMap::new())
        .await
        .unwrap();
    let receipt = outcome.receipt().expect("store should fully succeed").clone();

    assert!(receipt.ciphertext_size > receipt.plaintext_size);
    assert_eq!(receipt.plaintext_size, 5);
    assert!(receipt.storage_cost > 0);

    let plaintext = bridge.read(receipt.content_id).await.unwrap();
    assert_eq!(plaintext, b"hello");
}

#[tokio::test]
async fn stored_object_carries_its_linkage() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let outcome = bridge
        .store(b"hello", 5, true, BTreeMap::new())
        .await
        .unwrap();
    let receipt = outcome.receipt().unwrap();

    let attributes = bridge.get_attributes(receipt.object_id).await.unwrap();
    assert_eq!(
        attributes.get(ATTR_CAP_ID),
        Some(&receipt.policy.cap_id.to_string())
    );
    assert_eq!(
        attributes.get(ATTR_WHITELIST_ID),
        Some(&receipt.policy.whitelist_id.to_string())
    );
}

#[tokio::test]
async fn attribute_updates_preserve_linkage() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let outcome = bridge
        .store(b"hello", 5, true, BTreeMap::new())
        .await
        .unwrap();
    let receipt = outcome.receipt().unwrap();

    let mut extra = BTreeMap::new();
    extra.insert("k".to_string(), "v".to_string());
    bridge.add_attributes(receipt.object_id, extra).await.unwrap();

    let attributes = bridge.get_attributes(receipt.object_id).await.unwrap();
    assert_eq!(attributes.get("k"), Some(&"v".to_string()));
    assert!(attributes.contains_key(ATTR_CAP_ID));
    assert!(attributes.contains_key(ATTR_WHITELIST_ID));
}

#[tokio::test]
async fn user_attributes_cannot_clobber_linkage_keys() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let mut extra = BTreeMap::new();
    extra.insert(ATTR_CAP_ID.to_string(), "0xbogus".to_string());
    let outcome = bridge.store(b"hello", 5, true, extra).await.unwrap();
    let receipt = outcome.receipt().unwrap();

    let attributes = bridge.get_attributes(receipt.object_id).await.unwrap();
    assert_eq!(
        attributes.get(ATTR_CAP_ID),
        Some(&receipt.policy.cap_id.to_string())
    );
}

#[tokio::test]
async fn failed_linkage_surfaces_an_orphaned_object() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    cluster.blob.fail_next_attach().await;
    let outcome = bridge
        .store(b"orphan", 5, true, BTreeMap::new())
        .await
        .unwrap();

    let (object_id, content_id) = match outcome {
        StoreOutcome::StoredOrphaned {
            object_id,
            content_id,
            ..
        } => (object_id, content_id),
        other => panic!("expected an orphaned outcome, got {other:?}"),
    };

    // The object exists but is undiscoverable for decryption.
    assert_matches!(
        bridge.read(content_id).await,
        Err(VelumError::LinkageMissing { object }) if object == object_id
    );
}

#[tokio::test]
async fn relink_recovers_an_orphaned_object() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    cluster.blob.fail_next_attach().await;
    let outcome = bridge
        .store(b"orphan", 5, true, BTreeMap::new())
        .await
        .unwrap();
    let (object_id, content_id, policy) = match outcome {
        StoreOutcome::StoredOrphaned {
            object_id,
            content_id,
            policy,
            ..
        } => (object_id, content_id, policy),
        other => panic!("expected an orphaned outcome, got {other:?}"),
    };

    // A retry that fails again reports the object as still orphaned.
    cluster.blob.fail_next_attach().await;
    assert_matches!(
        bridge.relink(object_id, &policy).await,
        Err(VelumError::LinkageFailed { object, .. }) if object == object_id
    );

    bridge.relink(object_id, &policy).await.unwrap();
    assert_eq!(bridge.read(content_id).await.unwrap(), b"orphan");
}

#[tokio::test]
async fn unknown_content_id_is_not_found() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let bogus = velum_core::ContentId::for_bytes(b"never stored");
    assert_matches!(bridge.read(bogus).await, Err(VelumError::NotFound { .. }));
}

#[tokio::test]
async fn unfunded_wallet_is_rejected_before_any_upload() {
    let cluster = TestCluster::new().await;
    let broke = Arc::new(TestSigner::from_seed(9));
    let bridge = bridge_for(&cluster, broke);

    assert_matches!(
        bridge.store(b"hello", 5, true, BTreeMap::new()).await,
        Err(VelumError::InsufficientFunds { .. })
    );
}

#[tokio::test]
async fn listing_degrades_per_object_on_attribute_failures() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let mut object_ids = Vec::new();
    for payload in [b"one".as_slice(), b"two".as_slice(), b"three".as_slice()] {
        let outcome = bridge.store(payload, 5, true, BTreeMap::new()).await.unwrap();
        object_ids.push(outcome.receipt().unwrap().object_id);
    }
    cluster.blob.fail_attributes_for(object_ids[1]).await;

    let listing = bridge.list(true).await.unwrap();
    assert_eq!(listing.len(), 3);
    for enriched in &listing {
        if enriched.object.object_id == object_ids[1] {
            assert!(enriched.attributes.is_empty());
        } else {
            assert!(enriched.attributes.contains_key(ATTR_WHITELIST_ID));
        }
    }

    // Once the attribute store recovers, the listing does too.
    cluster.blob.clear_attribute_failure(object_ids[1]).await;
    let recovered = bridge.list(true).await.unwrap();
    assert!(recovered
        .iter()
        .all(|enriched| enriched.attributes.contains_key(ATTR_WHITELIST_ID)));
}

#[tokio::test]
async fn listing_survives_extreme_retention_windows() {
    let cluster = TestCluster::new().await;
    cluster
        .fund(cluster.signer.address(), 0, 10_000_000_000)
        .await;
    let bridge = bridge(&cluster);

    let epochs = (i32::MAX as u64) * 4;
    bridge
        .store(b"forever", epochs, true, BTreeMap::new())
        .await
        .unwrap();

    let listing = bridge.list(false).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert!(!listing[0].is_expired);
    // The wall-clock projection saturates out of range rather than
    // wrapping into the past.
    assert!(listing[0].expires_at.is_none());
}

#[tokio::test]
async fn listing_projects_expiry_from_the_current_epoch() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let outcome = bridge
        .store(b"short-lived", 1, true, BTreeMap::new())
        .await
        .unwrap();
    let receipt = outcome.receipt().unwrap().clone();

    let fresh = bridge.list(false).await.unwrap();
    assert_eq!(fresh.len(), 1);
    assert!(!fresh[0].is_expired);
    assert!(fresh[0].expires_at.is_some());

    cluster.ledger.advance_epochs(2).await;

    assert!(bridge.list(false).await.unwrap().is_empty());
    let with_expired = bridge.list(true).await.unwrap();
    assert_eq!(with_expired.len(), 1);
    assert_eq!(with_expired[0].object.object_id, receipt.object_id);
    assert!(with_expired[0].is_expired);
    assert_eq!(with_expired[0].expires_at, None);
}

#[tokio::test]
async fn burn_honors_the_deletable_flag() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let deletable = bridge
        .store(b"deletable", 5, true, BTreeMap::new())
        .await
        .unwrap()
        .receipt()
        .unwrap()
        .clone();
    let permanent = bridge
        .store(b"permanent", 5, false, BTreeMap::new())
        .await
        .unwrap()
        .receipt()
        .unwrap()
        .clone();

    let report = bridge.burn(BurnSelector::All).await.unwrap();
    assert_eq!(report.burned, vec![deletable.object_id]);
    assert_eq!(report.skipped_not_deletable, vec![permanent.object_id]);

    assert_matches!(
        bridge.read(deletable.content_id).await,
        Err(VelumError::NotFound { .. })
    );
    assert_eq!(bridge.read(permanent.content_id).await.unwrap(), b"permanent");
}

#[tokio::test]
async fn burn_expired_leaves_live_objects_alone() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let short = bridge
        .store(b"short", 1, true, BTreeMap::new())
        .await
        .unwrap()
        .receipt()
        .unwrap()
        .clone();
    let long = bridge
        .store(b"long", 10, true, BTreeMap::new())
        .await
        .unwrap()
        .receipt()
        .unwrap()
        .clone();

    cluster.ledger.advance_epochs(2).await;
    let report = bridge.burn(BurnSelector::Expired).await.unwrap();
    assert_eq!(report.burned, vec![short.object_id]);

    assert_eq!(bridge.read(long.content_id).await.unwrap(), b"long");
}

#[tokio::test]
async fn wallet_balance_reflects_spending() {
    let cluster = TestCluster::new().await;
    let bridge = bridge(&cluster);

    let before = bridge.wallet_balance().await.unwrap();
    bridge
        .store(b"hello", 5, true, BTreeMap::new())
        .await
        .unwrap();
    let after = bridge.wallet_balance().await.unwrap();

    assert!(after.primary < before.primary);
    assert!(after.storage < before.storage);
}
