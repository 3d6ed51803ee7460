//! The credential-verification capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::VerifierError;

/// Outcome of a single verification attempt.
///
/// Invalid input is a normal outcome, never an error; a [`VerifierError`]
/// means the environment itself failed (keychain unreachable, platform API
/// broke), not that the user presented a bad credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Credential accepted.
    Success,
    /// Credential rejected. The user may try again.
    Failure,
    /// The user dismissed the prompt. Treated silently, no error surfaced.
    Cancelled,
    /// Verification cannot run here (no hardware, nothing enrolled).
    /// Callers should surface a notice and must not retry automatically.
    Unavailable,
}

/// Capability query used by the UI to decide whether to show a biometric
/// prompt or fall back to PIN entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub supported: bool,
    pub enrolled: bool,
}

impl Availability {
    /// Verification can actually run: hardware present and credentials
    /// enrolled.
    pub fn usable(&self) -> bool {
        self.supported && self.enrolled
    }
}

/// A way of checking that the person at the device is the account holder.
///
/// The session manager is agnostic to which variant it holds; the embedding
/// application selects one per platform and injects it at construction time.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check a credential. Required for PIN verification, ignored for
    /// biometrics.
    async fn verify(&self, credential: Option<&str>) -> Result<VerifyOutcome, VerifierError>;

    /// Whether this verifier can run in the current environment.
    async fn availability(&self) -> Result<Availability, VerifierError>;
}
