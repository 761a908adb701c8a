use assert_matches::assert_matches;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use velum_core::{DecryptRequest, SealEffects, SignerEffects, VelumError};
use velum_policy::PolicyManager;
use velum_seal::{build_session_proof_at, SealCoordinator};
use velum_testkit::TestCluster;

fn coordinator(
    cluster: &TestCluster,
) -> SealCoordinator<velum_testkit::InMemoryLedger, velum_testkit::InMemorySealCluster> {
    let policy = PolicyManager::new(Arc::clone(&cluster.ledger), cluster.signer.address());
    SealCoordinator::new(policy, Arc::clone(&cluster.seal))
}

#[tokio::test]
async fn encode_then_decode_roundtrips_for_the_creator() {
    let cluster = TestCluster::new().await;
    let seal = coordinator(&cluster);

    let (payload, policy) = seal
        .encode(b"attack at dawn", cluster.signer.address())
        .await
        .unwrap();
    assert!(payload.len() > b"attack at dawn".len() as u64);
    assert_eq!(payload.identity, policy.whitelist_id);

    let plaintext = seal
        .decode(payload, policy.whitelist_id, cluster.signer.as_ref())
        .await
        .unwrap();
    assert_eq!(plaintext, b"attack at dawn");
}

#[tokio::test]
async fn non_member_is_denied_regardless_of_ciphertext_validity() {
    let cluster = TestCluster::new().await;
    let seal = coordinator(&cluster);
    let outsider = cluster.funded_signer(2).await;

    let (payload, policy) = seal
        .encode(b"secret", cluster.signer.address())
        .await
        .unwrap();

    let result = seal
        .decode(payload, policy.whitelist_id, outsider.as_ref())
        .await;
    assert_matches!(
        result,
        Err(VelumError::AccessDenied { address, .. }) if address == outsider.address()
    );
}

#[tokio::test]
async fn removed_member_loses_access() {
    let cluster = TestCluster::new().await;
    let seal = coordinator(&cluster);
    let creator = cluster.signer.address();

    let (payload, policy) = seal.encode(b"secret", creator).await.unwrap();
    seal.policy_manager()
        .remove_members(policy.whitelist_id, policy.cap_id, &[creator])
        .await
        .unwrap();

    let result = seal
        .decode(payload, policy.whitelist_id, cluster.signer.as_ref())
        .await;
    assert_matches!(result, Err(VelumError::AccessDenied { .. }));
}

#[tokio::test]
async fn too_few_responsive_servers_is_insufficient_shares() {
    let cluster = TestCluster::new().await;
    let seal = coordinator(&cluster);

    let (payload, policy) = seal
        .encode(b"secret", cluster.signer.address())
        .await
        .unwrap();

    cluster.seal.set_responsive(1).await;
    let result = seal
        .decode(payload, policy.whitelist_id, cluster.signer.as_ref())
        .await;
    assert_matches!(
        result,
        Err(VelumError::InsufficientShares {
            collected: 1,
            threshold: 2,
        })
    );
}

#[tokio::test]
async fn stale_session_proof_is_rejected() {
    let cluster = TestCluster::new().await;
    let seal = coordinator(&cluster);

    let (payload, policy) = seal
        .encode(b"secret", cluster.signer.address())
        .await
        .unwrap();

    let preview =
        velum_core::ApprovalPreview::new(cluster.signer.address(), policy.whitelist_id);
    let issued_at = OffsetDateTime::now_utc() - Duration::hours(2);
    let proof = build_session_proof_at(cluster.signer.as_ref(), &preview, issued_at, 60)
        .await
        .unwrap();

    let result = cluster
        .seal
        .decrypt(DecryptRequest {
            payload,
            proof,
            preview,
        })
        .await;
    assert_matches!(result, Err(VelumError::ExpiredSessionProof { ttl_secs: 60, .. }));
}

#[tokio::test]
async fn tampered_proof_binding_is_denied() {
    let cluster = TestCluster::new().await;
    let seal = coordinator(&cluster);

    let (payload, policy) = seal
        .encode(b"secret", cluster.signer.address())
        .await
        .unwrap();

    // Sign over one preview, submit another: the binding must not transfer.
    let signed_preview = velum_core::ApprovalPreview::new(
        cluster.signer.address(),
        velum_core::WhitelistId::new(velum_core::ObjectId::from_bytes([0xaa; 32])),
    );
    let submitted_preview =
        velum_core::ApprovalPreview::new(cluster.signer.address(), policy.whitelist_id);
    let proof = build_session_proof_at(
        cluster.signer.as_ref(),
        &signed_preview,
        OffsetDateTime::now_utc(),
        60,
    )
    .await
    .unwrap();

    let result = cluster
        .seal
        .decrypt(DecryptRequest {
            payload,
            proof,
            preview: submitted_preview,
        })
        .await;
    assert_matches!(result, Err(VelumError::AccessDenied { .. }));
}
