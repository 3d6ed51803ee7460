//! Session lifecycle management.
//!
//! `SessionManager` owns the in-memory authentication state, the expiry
//! timer, and the verification protocol. A session is represented by a
//! single persisted timestamp (epoch milliseconds) marking the last
//! successful verification; the manager is the only writer of that
//! timestamp. Expiry is enforced twice: a proactive timer armed on every
//! successful authentication, and a lazy re-validation against the stored
//! timestamp's age on every [`SessionManager::is_user_authenticated`] call,
//! so a stale in-memory flag can never outlive the persisted window.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::store::SessionStore;

use super::verifier::{Availability, CredentialVerifier, VerifyOutcome};

/// Authentication state as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// A verification attempt is in flight.
    Authenticating,
    Authenticated,
}

/// A session is expired once strictly more than the session duration has
/// passed; a timestamp aged exactly the duration is still within the window.
fn has_expired(last_auth_ms: i64, now_ms: i64, duration_ms: i64) -> bool {
    now_ms - last_auth_ms > duration_ms
}

/// Mutable manager state guarded by the internal lock.
struct ManagerState {
    session: SessionState,
    /// Bumped by every `authenticate` start and every `logout`. An in-flight
    /// verification result whose epoch no longer matches is discarded, so a
    /// logout (or a newer authenticate) always wins over a slow prompt.
    epoch: u64,
    expiry_timer: Option<JoinHandle<()>>,
    liveness: Option<JoinHandle<()>>,
    liveness_tx: Option<watch::Sender<bool>>,
}

impl ManagerState {
    fn cancel_expiry_timer(&mut self) {
        if let Some(handle) = self.expiry_timer.take() {
            handle.abort();
        }
    }

    fn publish_liveness(&self, authenticated: bool) {
        if let Some(tx) = &self.liveness_tx {
            tx.send_replace(authenticated);
        }
    }
}

struct Inner {
    store: Arc<dyn SessionStore>,
    verifier: Arc<dyn CredentialVerifier>,
    config: SessionConfig,
    state: Mutex<ManagerState>,
}

/// Owns the single authenticated session.
///
/// Construct one instance at application start and inject it into every
/// consumer. Internal operations are serialized behind a lock; credential
/// verification itself runs outside the lock so a slow biometric prompt
/// never blocks `logout` or `is_user_authenticated`.
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a manager and restore any persisted session.
    ///
    /// A stored timestamp still within the session window starts the manager
    /// `Authenticated` with the expiry timer armed for the remaining time;
    /// an expired timestamp is cleared proactively.
    pub async fn new(
        store: Arc<dyn SessionStore>,
        verifier: Arc<dyn CredentialVerifier>,
        config: SessionConfig,
    ) -> Self {
        let inner = Arc::new(Inner {
            store,
            verifier,
            config,
            state: Mutex::new(ManagerState {
                session: SessionState::Unauthenticated,
                epoch: 0,
                expiry_timer: None,
                liveness: None,
                liveness_tx: None,
            }),
        });
        inner.restore().await;
        Self { inner }
    }

    /// Run the verification protocol and, on success, establish a session.
    ///
    /// `credential` is required for PIN verification and ignored for
    /// biometrics. Returns `false` on any verification failure, environment
    /// unavailability or internal error; causes are logged, never raised.
    pub async fn authenticate(&self, credential: Option<&str>) -> bool {
        let epoch = {
            let mut state = self.inner.state.lock().await;
            state.epoch += 1;
            state.session = SessionState::Authenticating;
            state.epoch
        };

        // The prompt (or the PIN mismatch penalty) can take a while; the
        // state lock is not held across it.
        let outcome = self.inner.verifier.verify(credential).await;

        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            debug!("discarding verification result superseded by a later operation");
            return false;
        }

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "credential verification errored");
                state.session = SessionState::Unauthenticated;
                state.cancel_expiry_timer();
                state.publish_liveness(false);
                return false;
            }
        };

        match outcome {
            VerifyOutcome::Success => {
                state.session = SessionState::Authenticated;
                let now = Utc::now().timestamp_millis();
                if let Err(e) = self
                    .inner
                    .store
                    .set(&self.inner.config.storage_key, &now.to_string())
                    .await
                {
                    // The user already passed verification; a failed write
                    // is logged but does not roll the session back.
                    warn!(error = %e, "failed to persist session timestamp");
                }
                self.inner
                    .arm_expiry_timer(&mut state, self.inner.config.session_duration_ms);
                state.publish_liveness(true);
                info!("authentication succeeded");
                true
            }
            VerifyOutcome::Failure => {
                debug!("credential rejected");
                self.fail_authentication(&mut state);
                false
            }
            VerifyOutcome::Cancelled => {
                debug!("verification prompt dismissed");
                self.fail_authentication(&mut state);
                false
            }
            VerifyOutcome::Unavailable => {
                warn!("verification unavailable in this environment");
                self.fail_authentication(&mut state);
                false
            }
        }
    }

    fn fail_authentication(&self, state: &mut ManagerState) {
        state.session = SessionState::Unauthenticated;
        state.cancel_expiry_timer();
        state.publish_liveness(false);
    }

    /// Whether a valid session exists right now.
    ///
    /// Re-validates the stored timestamp's age on every call rather than
    /// trusting the in-memory flag, closing the window between the timestamp
    /// going stale and the expiry timer firing. A stale session found here
    /// is cleared on the spot.
    pub async fn is_user_authenticated(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        self.inner.revalidate(&mut state).await
    }

    /// Drop the session unconditionally. Idempotent.
    ///
    /// Also cancels any in-flight `authenticate`: a verification result that
    /// arrives after this call is discarded.
    pub async fn logout(&self) {
        let mut state = self.inner.state.lock().await;
        state.epoch += 1;
        self.inner.clear_session(&mut state).await;
        info!("logged out");
    }

    /// Current in-memory state, without re-validating the stored timestamp.
    pub async fn state(&self) -> SessionState {
        self.inner.state.lock().await.session
    }

    /// Whether the configured verifier can run here. Used by the UI to pick
    /// between the biometric prompt and PIN entry.
    pub async fn check_verifier_availability(&self) -> Availability {
        match self.inner.verifier.availability().await {
            Ok(availability) => availability,
            Err(e) => {
                warn!(error = %e, "verifier availability probe failed");
                Availability {
                    supported: false,
                    enrolled: false,
                }
            }
        }
    }

    /// Start the periodic liveness re-check.
    ///
    /// The returned channel carries the manager's current answer to
    /// [`is_user_authenticated`](Self::is_user_authenticated), refreshed
    /// every `liveness_interval_ms` and immediately on logout and expiry.
    /// Calling this again replaces the previous task.
    pub async fn start_liveness(&self) -> watch::Receiver<bool> {
        let mut state = self.inner.state.lock().await;
        let alive = self.inner.revalidate(&mut state).await;
        let (tx, rx) = watch::channel(alive);

        if let Some(handle) = state.liveness.take() {
            handle.abort();
        }
        state.liveness_tx = Some(tx);

        let weak = Arc::downgrade(&self.inner);
        let interval = Duration::from_millis(self.inner.config.liveness_interval_ms);
        state.liveness = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { return };
                let mut state = inner.state.lock().await;
                let alive = inner.revalidate(&mut state).await;
                state.publish_liveness(alive);
            }
        }));

        rx
    }

    /// Cancel the expiry timer and the liveness task.
    ///
    /// Call on teardown so no background task outlives the manager. Leaves
    /// both the in-memory state and the persisted timestamp untouched.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        state.cancel_expiry_timer();
        if let Some(handle) = state.liveness.take() {
            handle.abort();
        }
        state.liveness_tx = None;
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        // Best effort; anything not aborted here holds only a weak reference
        // and becomes a no-op once `Inner` is gone.
        if let Ok(mut state) = self.inner.state.try_lock() {
            state.cancel_expiry_timer();
            if let Some(handle) = state.liveness.take() {
                handle.abort();
            }
        }
    }
}

impl Inner {
    /// Read the persisted timestamp. Read failures and unparsable values are
    /// treated as "no session".
    async fn read_last_auth(&self) -> Option<i64> {
        let raw = match self.store.get(&self.config.storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read persisted session timestamp");
                return None;
            }
        };
        match raw.parse::<i64>() {
            Ok(timestamp) => Some(timestamp),
            Err(_) => {
                warn!(value = %raw, "malformed session timestamp, ignoring");
                None
            }
        }
    }

    /// Restore state from the store at construction time.
    async fn restore(self: &Arc<Self>) {
        let Some(last_auth) = self.read_last_auth().await else {
            return;
        };
        let now = Utc::now().timestamp_millis();
        if has_expired(last_auth, now, self.config.session_duration_ms) {
            debug!("clearing expired session found at startup");
            if let Err(e) = self.store.remove(&self.config.storage_key).await {
                warn!(error = %e, "failed to clear expired session timestamp");
            }
            return;
        }

        let remaining = (self.config.session_duration_ms - (now - last_auth)).max(0);
        let mut state = self.state.lock().await;
        state.session = SessionState::Authenticated;
        self.arm_expiry_timer(&mut state, remaining);
        info!(remaining_ms = remaining, "restored persisted session");
    }

    /// Check the in-memory flag against the stored timestamp's age, clearing
    /// the session when they disagree. Caller holds the lock.
    async fn revalidate(self: &Arc<Self>, state: &mut ManagerState) -> bool {
        if state.session != SessionState::Authenticated {
            return false;
        }
        let Some(last_auth) = self.read_last_auth().await else {
            warn!("authenticated flag held without a persisted timestamp, clearing session");
            self.clear_session(state).await;
            return false;
        };
        let now = Utc::now().timestamp_millis();
        if has_expired(last_auth, now, self.config.session_duration_ms) {
            debug!("stored session timestamp has expired");
            self.clear_session(state).await;
            return false;
        }
        true
    }

    /// Arm the expiry timer. Always cancels the previous timer first, so at
    /// most one timer is armed regardless of how authentications interleave.
    fn arm_expiry_timer(self: &Arc<Self>, state: &mut ManagerState, duration_ms: i64) {
        state.cancel_expiry_timer();
        let epoch = state.epoch;
        let weak = Arc::downgrade(self);
        let duration = Duration::from_millis(duration_ms.max(0) as u64);

        state.expiry_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let Some(inner) = weak.upgrade() else { return };
            let mut state = inner.state.lock().await;
            if state.epoch != epoch {
                // a later authenticate or logout superseded this timer
                return;
            }
            debug!("session duration elapsed, expiring session");
            // This task is the armed timer; drop the handle so clear_session
            // does not abort the task out from under itself.
            state.expiry_timer = None;
            inner.clear_session(&mut state).await;
        }));
    }

    /// Transition to `Unauthenticated`: cancel the timer, clear the stored
    /// timestamp, tell liveness watchers. Caller holds the lock.
    async fn clear_session(&self, state: &mut ManagerState) {
        state.session = SessionState::Unauthenticated;
        state.cancel_expiry_timer();
        if let Err(e) = self.store.remove(&self.config.storage_key).await {
            warn!(error = %e, "failed to clear persisted session timestamp");
        }
        state.publish_liveness(false);
    }
}
