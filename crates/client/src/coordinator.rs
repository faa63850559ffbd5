//! Single-flight refresh coordination
//!
//! At most one refresh exchange is in flight per client instance. The
//! first request to observe an expired credential becomes the cycle
//! leader and runs the exchange; requests arriving while the cycle is
//! open park as waiters and receive the leader's outcome. The outcome —
//! one new token pair, or one shared error — fans out to every waiter in
//! FIFO enqueue order, and the state returns to `Idle` so a later expiry
//! starts a fresh cycle.
//!
//! The state mutex is a `std::sync::Mutex`: the critical sections are a
//! few pointer moves and never cross an await, and a synchronous lock lets
//! the cancellation guard restore `Idle` from `Drop`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokenflight_auth::{CredentialStore, TokenExchange, TokenPair};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::session::SessionTerminator;

type Outcome = Result<TokenPair, tokenflight_auth::Error>;

/// A parked request awaiting the in-flight cycle. Settled exactly once:
/// either the leader sends the shared outcome, or the leader is dropped
/// and the closed channel surfaces as `Interrupted`.
type Waiter = oneshot::Sender<Outcome>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
}

/// Guarantees single-flight refresh and fans the outcome out to waiters.
///
/// One instance per client. All transitions between `Idle` and
/// `Refreshing` happen inside the state mutex; the exchange itself runs
/// outside it.
pub struct RefreshCoordinator {
    exchange: Arc<dyn TokenExchange>,
    store: Arc<CredentialStore>,
    terminator: SessionTerminator,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        exchange: Arc<dyn TokenExchange>,
        store: Arc<CredentialStore>,
        terminator: SessionTerminator,
    ) -> Self {
        Self {
            exchange,
            store,
            terminator,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Obtain a fresh token pair, joining the in-flight cycle if one is
    /// open.
    ///
    /// Exactly one exchange call happens per cycle no matter how many
    /// requests enter here concurrently. On success every caller gets the
    /// same pair, already stored; on failure every caller gets the same
    /// error and the session has been terminated once.
    pub async fn refresh(&self) -> Outcome {
        let waiter_rx = {
            let mut state = self.lock_state();
            match &mut *state {
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    None
                }
                RefreshState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    metrics::counter!("refresh_waiters_total").increment(1);
                    Some(rx)
                }
            }
        };

        match waiter_rx {
            Some(rx) => {
                debug!("refresh already in flight, parking until it settles");
                match rx.await {
                    Ok(outcome) => outcome,
                    // Leader dropped mid-cycle; the cycle was rolled back.
                    Err(_) => Err(tokenflight_auth::Error::Interrupted),
                }
            }
            None => self.lead_cycle().await,
        }
    }

    /// Run one full cycle as the leader: exchange, store update,
    /// settlement fan-out, and session termination on failure.
    async fn lead_cycle(&self) -> Outcome {
        metrics::counter!("refresh_cycles_total").increment(1);
        debug!("starting refresh cycle as leader");

        let guard = CycleGuard { coordinator: self };
        let outcome = self.run_exchange().await;
        let waiters = guard.settle();

        match &outcome {
            Ok(_) => {
                info!(waiters = waiters.len(), "refresh cycle succeeded");
            }
            Err(e) => {
                metrics::counter!("refresh_failures_total").increment(1);
                warn!(waiters = waiters.len(), error = %e, "refresh cycle failed");
            }
        }

        // FIFO hand-off. A waiter whose caller went away just drops the
        // receiving end; its outcome is discarded.
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        if let Err(e) = &outcome {
            self.terminator.terminate(e).await;
        }

        outcome
    }

    /// The exchange proper: read the refresh token, call the endpoint
    /// once, store the new pair whole before anyone is settled with it.
    async fn run_exchange(&self) -> Outcome {
        let refresh_token = self
            .store
            .refresh_token()
            .await
            .ok_or(tokenflight_auth::Error::MissingCredential)?;

        let response = self.exchange.refresh(&refresh_token).await?;
        let pair = TokenPair::from_response(response);
        self.store.set_pair(pair.clone()).await?;
        Ok(pair)
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }
}

/// Restores `Idle` when the leader finishes — or when it is dropped
/// mid-exchange, in which case the queued waiters are dropped with it and
/// their closed channels surface as `Interrupted`.
struct CycleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
}

impl CycleGuard<'_> {
    /// Close the cycle normally: take the whole waiter queue and reset to
    /// `Idle` in one critical section, so no waiter can slip in between.
    fn settle(self) -> Vec<Waiter> {
        let waiters = {
            let mut state = self.coordinator.lock_state();
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };
        std::mem::forget(self);
        waiters
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.coordinator.lock_state();
        if let RefreshState::Refreshing { waiters } = std::mem::replace(&mut *state, RefreshState::Idle) {
            warn!(
                waiters = waiters.len(),
                "refresh leader dropped mid-cycle, rolling back to idle"
            );
        }
    }
}
