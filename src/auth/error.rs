use thiserror::Error;

use crate::store::StorageError;

/// Unexpected environment failures raised by a credential verifier.
///
/// Ordinary outcomes of checking a credential (wrong PIN, failed biometric
/// match, dismissed prompt, missing hardware) are not errors; they are
/// [`VerifyOutcome`](super::VerifyOutcome) variants.
#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("verifier platform failure: {0}")]
    Platform(#[source] anyhow::Error),

    #[error("reference PIN must be exactly 6 digits")]
    MalformedPin,
}
