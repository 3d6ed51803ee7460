//! Authgate - the authenticated-session core a banking front end sits on.
//!
//! This library owns everything between "the user typed a PIN / touched the
//! sensor" and "the app may show account data": a [`SessionManager`] holding
//! the in-memory authentication state and expiry timer, pluggable
//! [`CredentialVerifier`] implementations (biometric prompt on device, PIN
//! comparison elsewhere), and [`SessionStore`] backends persisting the
//! session marker (OS keychain, JSON file, in-memory fallback).
//!
//! The consuming UI needs four calls: [`SessionManager::authenticate`],
//! [`SessionManager::is_user_authenticated`], [`SessionManager::logout`] and
//! [`SessionManager::check_verifier_availability`]. Screens, navigation and
//! data fetching live in the embedding application, not here.

pub mod auth;
pub mod config;
pub mod store;

pub use auth::{
    Availability, BiometricDevice, BiometricVerifier, CredentialVerifier, PinVerifier,
    PromptOptions, PromptResponse, SessionManager, SessionState, VerifierError, VerifyOutcome,
};
pub use config::SessionConfig;
pub use store::{FileStore, KeychainStore, MemoryStore, SessionStore, StorageError};
