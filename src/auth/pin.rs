//! PIN credential verification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::store::SessionStore;

use super::error::VerifierError;
use super::verifier::{Availability, CredentialVerifier, VerifyOutcome};

/// Required PIN length.
const PIN_LENGTH: usize = 6;

/// Fixed delay after a failed comparison to slow brute-force attempts.
const MISMATCH_DELAY: Duration = Duration::from_secs(1);

/// Verifies a six-digit PIN against a stored reference PIN.
///
/// The reference PIN lives in the session store under `pin_key`; until one
/// has been set during first-time setup, the configured default applies.
/// Input of any other length fails before the comparison runs. A mismatch
/// waits [`MISMATCH_DELAY`] before reporting failure.
///
/// On success this verifier only reports success; persisting the session
/// timestamp is the session manager's job.
pub struct PinVerifier {
    store: Arc<dyn SessionStore>,
    pin_key: String,
    default_pin: String,
}

impl PinVerifier {
    pub fn new(
        store: Arc<dyn SessionStore>,
        pin_key: impl Into<String>,
        default_pin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            pin_key: pin_key.into(),
            default_pin: default_pin.into(),
        }
    }

    /// Store a new reference PIN, replacing the default or any earlier one.
    pub async fn set_reference_pin(&self, pin: &str) -> Result<(), VerifierError> {
        if !is_well_formed(pin) {
            return Err(VerifierError::MalformedPin);
        }
        self.store.set(&self.pin_key, pin).await?;
        Ok(())
    }

    async fn reference_pin(&self) -> Result<String, VerifierError> {
        match self.store.get(&self.pin_key).await? {
            Some(stored) => Ok(stored),
            None => Ok(self.default_pin.clone()),
        }
    }
}

fn is_well_formed(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.chars().all(|c| c.is_ascii_digit())
}

#[async_trait]
impl CredentialVerifier for PinVerifier {
    async fn verify(&self, credential: Option<&str>) -> Result<VerifyOutcome, VerifierError> {
        let Some(pin) = credential else {
            debug!("PIN verification requested without a credential");
            return Ok(VerifyOutcome::Failure);
        };

        // Length gate comes before any comparison.
        if pin.len() != PIN_LENGTH {
            debug!(len = pin.len(), "rejecting PIN of wrong length");
            return Ok(VerifyOutcome::Failure);
        }

        if pin == self.reference_pin().await? {
            Ok(VerifyOutcome::Success)
        } else {
            debug!("PIN mismatch");
            tokio::time::sleep(MISMATCH_DELAY).await;
            Ok(VerifyOutcome::Failure)
        }
    }

    /// PIN entry needs no hardware and nothing enrolled; it is always usable.
    async fn availability(&self) -> Result<Availability, VerifierError> {
        Ok(Availability {
            supported: true,
            enrolled: true,
        })
    }
}
