//! Session proof construction and the decrypt-attempt state machine

use std::fmt;
use time::OffsetDateTime;
use velum_core::{ApprovalPreview, SessionProof, SignerEffects, VelumError, VelumResult};

/// Phases of a single decrypt attempt.
///
/// `Requested → ProofBuilt → SharesCollecting` then exactly one terminal
/// phase. No retries are automatic; a caller must re-issue a fresh session
/// proof after `ExpiredSessionProof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptPhase {
    /// Decrypt attempt started
    Requested,
    /// Session proof signed and bound to the approval preview
    ProofBuilt,
    /// Request submitted; key shares being collected
    SharesCollecting,
    /// Terminal: plaintext recovered
    Decrypted,
    /// Terminal: requester is not a current whitelist member
    AccessDenied,
    /// Terminal: fewer than `t` key servers responded
    InsufficientShares,
    /// Terminal: the proof's time-to-live elapsed first
    ExpiredSessionProof,
}

impl DecryptPhase {
    /// The terminal phase a decrypt result maps to.
    pub fn terminal<T>(result: &VelumResult<T>) -> Self {
        match result {
            Ok(_) => Self::Decrypted,
            Err(VelumError::AccessDenied { .. }) => Self::AccessDenied,
            Err(VelumError::InsufficientShares { .. }) => Self::InsufficientShares,
            Err(VelumError::ExpiredSessionProof { .. }) => Self::ExpiredSessionProof,
            // Other failures terminate the attempt without a dedicated phase.
            Err(_) => Self::SharesCollecting,
        }
    }
}

impl fmt::Display for DecryptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requested => "requested",
            Self::ProofBuilt => "proof-built",
            Self::SharesCollecting => "shares-collecting",
            Self::Decrypted => "decrypted",
            Self::AccessDenied => "access-denied",
            Self::InsufficientShares => "insufficient-shares",
            Self::ExpiredSessionProof => "expired-session-proof",
        };
        f.write_str(name)
    }
}

/// Build and sign a session proof for `preview`, issued now.
pub async fn build_session_proof<S: SignerEffects>(
    signer: &S,
    preview: &ApprovalPreview,
    ttl_secs: u64,
) -> VelumResult<SessionProof> {
    build_session_proof_at(signer, preview, OffsetDateTime::now_utc(), ttl_secs).await
}

/// Build and sign a session proof with an explicit issuance time.
///
/// The signature covers the requester address, public key, preview digest,
/// issuance time, and TTL, so none of them can be swapped after signing.
pub async fn build_session_proof_at<S: SignerEffects>(
    signer: &S,
    preview: &ApprovalPreview,
    issued_at: OffsetDateTime,
    ttl_secs: u64,
) -> VelumResult<SessionProof> {
    let requester = signer.address();
    let public_key = signer.public_key();
    let preview_digest = preview.digest()?;
    let issued_at = issued_at.unix_timestamp();

    let message =
        SessionProof::signing_bytes(&requester, &public_key, &preview_digest, issued_at, ttl_secs)?;
    let signature = signer.sign(&message).await?;

    Ok(SessionProof {
        requester,
        public_key,
        preview_digest,
        issued_at,
        ttl_secs,
        signature,
    })
}
