//! Biometric credential verification.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::VerifierError;
use super::verifier::{Availability, CredentialVerifier, VerifyOutcome};

/// Platform biometric capability, supplied by the embedding application.
///
/// This crate ships no hardware driver; hosts implement the trait against
/// whatever the platform provides (Touch ID, BiometricPrompt, Windows Hello).
#[async_trait]
pub trait BiometricDevice: Send + Sync {
    /// Whether the device has biometric hardware at all.
    async fn has_hardware(&self) -> Result<bool>;

    /// Whether any biometric credentials are enrolled.
    async fn is_enrolled(&self) -> Result<bool>;

    /// Show the system prompt and wait for the user's answer.
    async fn prompt(&self, options: &PromptOptions) -> Result<PromptResponse>;
}

/// Text shown on the platform prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOptions {
    pub message: String,
    pub fallback_label: String,
    pub cancel_label: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            message: "Authenticate to view transactions".to_string(),
            fallback_label: "Use passcode".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }
}

/// What the user did with the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    /// The platform matched a biometric credential.
    Confirmed,
    /// The platform could not match one.
    Denied,
    /// The user dismissed the prompt.
    Dismissed,
}

/// Verifies the user through the platform biometric prompt.
///
/// Missing hardware or enrollment short-circuits to
/// [`VerifyOutcome::Unavailable`] without showing a prompt.
pub struct BiometricVerifier {
    device: Arc<dyn BiometricDevice>,
    options: PromptOptions,
}

impl BiometricVerifier {
    pub fn new(device: Arc<dyn BiometricDevice>) -> Self {
        Self::with_options(device, PromptOptions::default())
    }

    pub fn with_options(device: Arc<dyn BiometricDevice>, options: PromptOptions) -> Self {
        Self { device, options }
    }
}

#[async_trait]
impl CredentialVerifier for BiometricVerifier {
    async fn verify(&self, _credential: Option<&str>) -> Result<VerifyOutcome, VerifierError> {
        let availability = self.availability().await?;
        if !availability.usable() {
            warn!(
                supported = availability.supported,
                enrolled = availability.enrolled,
                "biometric verification unavailable"
            );
            return Ok(VerifyOutcome::Unavailable);
        }

        let response = self
            .device
            .prompt(&self.options)
            .await
            .map_err(VerifierError::Platform)?;

        Ok(match response {
            PromptResponse::Confirmed => VerifyOutcome::Success,
            PromptResponse::Denied => VerifyOutcome::Failure,
            PromptResponse::Dismissed => VerifyOutcome::Cancelled,
        })
    }

    async fn availability(&self) -> Result<Availability, VerifierError> {
        let supported = self
            .device
            .has_hardware()
            .await
            .map_err(VerifierError::Platform)?;
        // Enrollment only matters when there is hardware to enroll on.
        let enrolled = supported
            && self
                .device
                .is_enrolled()
                .await
                .map_err(VerifierError::Platform)?;

        Ok(Availability {
            supported,
            enrolled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeDevice {
        hardware: bool,
        enrolled: bool,
        response: PromptResponse,
        prompted: AtomicBool,
    }

    impl FakeDevice {
        fn new(hardware: bool, enrolled: bool, response: PromptResponse) -> Self {
            Self {
                hardware,
                enrolled,
                response,
                prompted: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl BiometricDevice for FakeDevice {
        async fn has_hardware(&self) -> Result<bool> {
            Ok(self.hardware)
        }

        async fn is_enrolled(&self) -> Result<bool> {
            Ok(self.enrolled)
        }

        async fn prompt(&self, _options: &PromptOptions) -> Result<PromptResponse> {
            self.prompted.store(true, Ordering::SeqCst);
            Ok(self.response)
        }
    }

    #[tokio::test]
    async fn test_confirmed_prompt_succeeds() {
        let device = Arc::new(FakeDevice::new(true, true, PromptResponse::Confirmed));
        let v = BiometricVerifier::new(device);
        assert_eq!(v.verify(None).await.unwrap(), VerifyOutcome::Success);
    }

    #[tokio::test]
    async fn test_denied_prompt_fails() {
        let device = Arc::new(FakeDevice::new(true, true, PromptResponse::Denied));
        let v = BiometricVerifier::new(device);
        assert_eq!(v.verify(None).await.unwrap(), VerifyOutcome::Failure);
    }

    #[tokio::test]
    async fn test_dismissed_prompt_is_cancelled() {
        let device = Arc::new(FakeDevice::new(true, true, PromptResponse::Dismissed));
        let v = BiometricVerifier::new(device);
        assert_eq!(v.verify(None).await.unwrap(), VerifyOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_hardware_is_unavailable_without_prompting() {
        let device = Arc::new(FakeDevice::new(false, false, PromptResponse::Confirmed));
        let v = BiometricVerifier::new(Arc::clone(&device) as Arc<dyn BiometricDevice>);

        assert_eq!(v.verify(None).await.unwrap(), VerifyOutcome::Unavailable);
        assert!(!device.prompted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_not_enrolled_is_unavailable_without_prompting() {
        let device = Arc::new(FakeDevice::new(true, false, PromptResponse::Confirmed));
        let v = BiometricVerifier::new(Arc::clone(&device) as Arc<dyn BiometricDevice>);

        assert_eq!(v.verify(None).await.unwrap(), VerifyOutcome::Unavailable);
        assert!(!device.prompted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_availability_reports_hardware_and_enrollment() {
        let device = Arc::new(FakeDevice::new(true, false, PromptResponse::Confirmed));
        let v = BiometricVerifier::new(device);

        let availability = v.availability().await.unwrap();
        assert!(availability.supported);
        assert!(!availability.enrolled);
        assert!(!availability.usable());
    }
}
