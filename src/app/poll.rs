//! Polling refresher for import jobs.
//!
//! A poller re-fetches the state of its tracked imports on a fixed interval
//! until every one of them is terminal (`SUCCESS` or `FAILED`). Only one fetch
//! is in flight per poller; ticks that come due meanwhile are skipped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::sources::ImportStatusSource;
use crate::state::PollTarget;

/// Why a poller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every target reached a terminal state.
    Completed,
    /// `stop` was called first.
    Stopped,
}

/// State shared between a poller task and its handles.
#[derive(Debug)]
struct Shared {
    /// Tracked targets with their last applied state.
    targets: Mutex<Vec<PollTarget>>,
    /// Set once by `stop`.
    stopped: AtomicBool,
    /// Wakes the poller out of its tick wait.
    stop_signal: Notify,
}

impl Shared {
    /// Lock the targets, recovering from a poisoned lock.
    fn targets(&self) -> MutexGuard<'_, Vec<PollTarget>> {
        match self.targets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Whether every target is terminal.
    fn all_terminal(&self) -> bool {
        self.targets().iter().all(|t| t.state.is_terminal())
    }

    /// Whether `stop` was called.
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Handle to a running poller; clones control the same poller.
#[derive(Debug, Clone)]
pub struct PollHandle {
    /// Shared poller state.
    shared: Arc<Shared>,
    /// Set to `Some` when the poller task ends.
    outcome: watch::Receiver<Option<PollOutcome>>,
}

impl PollHandle {
    /// What: Stop the poller.
    ///
    /// Details:
    /// - Idempotent and safe to call when no tick is in flight or after the
    ///   poller already completed.
    /// - A fetch already in flight finishes but its result is discarded;
    ///   states applied by earlier ticks stay as they are.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("[Poll] Stop requested");
            self.shared.stop_signal.notify_one();
        }
    }

    /// Copy of the tracked targets with their latest applied states.
    #[must_use]
    pub fn targets(&self) -> Vec<PollTarget> {
        self.shared.targets().clone()
    }

    /// Whether the poller task is still scheduling ticks.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.outcome.borrow().is_none()
    }

    /// What: Wait until the poller ends.
    ///
    /// Output:
    /// - `Completed` when all targets turned terminal, `Stopped` otherwise.
    pub async fn wait(&self) -> PollOutcome {
        let mut rx = self.outcome.clone();
        let result = rx.wait_for(Option::is_some).await.map(|o| *o);
        match result {
            Ok(Some(outcome)) => outcome,
            _ => PollOutcome::Stopped,
        }
    }
}

/// Starts pollers on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct Poller;

impl Poller {
    /// What: Start polling `targets` every `interval` with `fetch`.
    ///
    /// Inputs:
    /// - `targets`: Jobs to track.
    /// - `interval`: Time between ticks; the first tick fires immediately.
    /// - `fetch`: Returns the tracked targets with fresh states.
    ///
    /// Output:
    /// - A handle to stop, inspect or await the poller.
    ///
    /// Details:
    /// - Returned targets are matched back by `(owner, repo)`; unknown ones are ignored.
    /// - A failed fetch is logged and retried on the next tick.
    /// - Must be called from within a tokio runtime.
    pub fn start<F, Fut>(targets: Vec<PollTarget>, interval: Duration, fetch: F) -> PollHandle
    where
        F: Fn(Vec<PollTarget>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<PollTarget>>> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            targets: Mutex::new(targets),
            stopped: AtomicBool::new(false),
            stop_signal: Notify::new(),
        });
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let task_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let outcome = poll_loop(&task_shared, interval, fetch).await;
            tracing::debug!(?outcome, "[Poll] Poller finished");
            let _ = outcome_tx.send(Some(outcome));
        });
        PollHandle {
            shared,
            outcome: outcome_rx,
        }
    }
}

/// Tick loop of one poller.
async fn poll_loop<F, Fut>(shared: &Shared, interval: Duration, fetch: F) -> PollOutcome
where
    F: Fn(Vec<PollTarget>) -> Fut,
    Fut: Future<Output = Result<Vec<PollTarget>>>,
{
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick: u64 = 0;
    loop {
        if shared.all_terminal() {
            return PollOutcome::Completed;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            () = shared.stop_signal.notified() => return PollOutcome::Stopped,
        }
        if shared.is_stopped() {
            return PollOutcome::Stopped;
        }
        tick += 1;
        let snapshot = shared.targets().clone();
        let response = fetch(snapshot).await;
        if shared.is_stopped() {
            tracing::debug!(tick, "[Poll] Discarding response that arrived after stop");
            return PollOutcome::Stopped;
        }
        match response {
            Ok(fresh) => {
                let mut targets = shared.targets();
                for update in fresh {
                    if let Some(t) = targets.iter_mut().find(|t| t.key() == update.key()) {
                        t.state = update.state;
                    }
                }
                tracing::trace!(tick, "[Poll] Applied import states");
            }
            Err(e) => {
                tracing::warn!(tick, error = %e, "[Poll] Import status fetch failed; retrying next tick");
            }
        }
    }
}

/// What: Build a `fetch` function for [`Poller::start`] backed by a status source.
///
/// Details:
/// - Non-terminal targets are looked up concurrently; terminal ones are returned as is.
/// - A target whose lookup fails keeps its previous state; the tick only
///   fails when every lookup failed.
pub fn import_status_fetch<S>(
    source: Arc<S>,
) -> impl Fn(Vec<PollTarget>) -> BoxFuture<'static, Result<Vec<PollTarget>>> + Send + Sync + 'static
where
    S: ImportStatusSource + 'static,
{
    move |targets: Vec<PollTarget>| {
        let source = Arc::clone(&source);
        async move {
            let lookups = targets.iter().map(|t| {
                let source = Arc::clone(&source);
                async move {
                    if t.state.is_terminal() {
                        None
                    } else {
                        Some(source.import_state(t).await)
                    }
                }
            });
            let results = join_all(lookups).await;
            let mut first_error = None;
            let mut any_ok = false;
            let mut out = Vec::with_capacity(targets.len());
            for (target, result) in targets.iter().zip(results) {
                let mut updated = target.clone();
                match result {
                    None => any_ok = true,
                    Some(Ok(state)) => {
                        updated.state = state;
                        any_ok = true;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(
                            owner = %target.owner,
                            repo = %target.repo,
                            error = %e,
                            "[Poll] Import status lookup failed"
                        );
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
                out.push(updated);
            }
            match first_error {
                Some(e) if !any_ok => Err(e),
                _ => Ok(out),
            }
        }
        .boxed()
    }
}
