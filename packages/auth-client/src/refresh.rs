use crate::error::AuthError;
use std::future::Future;
use std::mem;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Single-flight state for the token-refresh protocol
enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<Result<String, AuthError>>>,
    },
}

/// Coordinates the token-refresh protocol
///
/// Every API call that fails with an expired token funnels through
/// [`RefreshCoordinator::refresh_access_token`]. The first caller while
/// idle becomes the leader and performs the one refresh call; callers
/// arriving while a refresh is in flight are queued and share the
/// leader's outcome. When the refresh settles the queue is drained in
/// enqueue order - with the rotated token on success, with the refresh
/// error on failure - and the coordinator returns to idle. Arrivals
/// during the drain observe the idle state and start a fresh cycle.
///
/// State transitions happen under a plain mutex that is never held
/// across an await, so a genuinely parallel runtime cannot start two
/// refreshes. A drop guard restores the idle state if the leader's
/// future is cancelled mid-refresh, so the refreshing state can never
/// stick.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
        }
    }

    fn locked(&self) -> MutexGuard<'_, RefreshState> {
        // State stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Swap the state back to idle, returning any queued waiters
    fn take_waiters(&self) -> Vec<oneshot::Sender<Result<String, AuthError>>> {
        match mem::replace(&mut *self.locked(), RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }

    /// Obtain a fresh access token, issuing at most one refresh call.
    ///
    /// `refresh` performs the actual call (and persists the rotated
    /// tokens); it only runs for the leader. Every caller - leader and
    /// queued alike - receives the same rotated token or the same
    /// refresh error.
    pub async fn refresh_access_token<F, Fut>(&self, refresh: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, AuthError>>,
    {
        let receiver = {
            let mut state = self.locked();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    Some(receiver)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(receiver) = receiver {
            debug!("Token refresh already in flight, queueing request");
            // A dropped sender means the leader was cancelled mid-refresh
            return receiver
                .await
                .unwrap_or(Err(AuthError::TokenInvalid));
        }

        let mut settle = SettleGuard {
            coordinator: self,
            armed: true,
        };
        let result = refresh().await;
        settle.armed = false;

        let waiters = self.take_waiters();
        match &result {
            Ok(_) => debug!(waiters = waiters.len(), "Token refresh succeeded"),
            Err(error) => warn!(waiters = waiters.len(), %error, "Token refresh failed"),
        }
        for waiter in waiters {
            // A waiter may have been dropped; its slot is simply skipped
            let _ = waiter.send(result.clone());
        }

        result
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores the idle state when the leader is cancelled before settling.
/// Dropping the queued senders rejects every waiter.
struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Refresh leader cancelled before settling, failing queued requests");
            drop(self.coordinator.take_waiters());
        }
    }
}
