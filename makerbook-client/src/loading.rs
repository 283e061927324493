//! Request-counting loading indicator.
//!
//! The indicator only appears once requests have been in flight for
//! [`LoadingTimings::delay`], and once shown it stays up for at least
//! [`LoadingTimings::min_visible`]. Timers run on the ambient Tokio runtime,
//! so `start`/`stop` must be called from within one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingTimings {
    pub delay: Duration,
    pub min_visible: Duration,
}

impl Default for LoadingTimings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(150),
            min_visible: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    in_flight: usize,
    visible_since: Option<Instant>,
    show_pending: bool,
    // Bumped whenever a scheduled hide must be abandoned.
    hide_epoch: u64,
}

#[derive(Debug)]
struct Inner {
    timings: LoadingTimings,
    state: Mutex<State>,
    visible: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct LoadingSignal {
    inner: Arc<Inner>,
}

impl LoadingSignal {
    pub fn new(timings: LoadingTimings) -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                timings,
                state: Mutex::new(State::default()),
                visible,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn timings(&self) -> LoadingTimings {
        self.inner.timings
    }

    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    /// Receives every visibility change.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }

    /// Counts one more request in flight.
    ///
    /// A show timer that is already pending is reused, so a request started
    /// after an earlier one stopped inside the same delay window can surface
    /// the indicator sooner than `delay` after its own start.
    pub fn start(&self) {
        let mut state = self.state();
        state.in_flight += 1;

        if state.visible_since.is_some() {
            state.hide_epoch += 1;
            return;
        }

        if !state.show_pending {
            state.show_pending = true;
            let signal = self.clone();
            let delay = self.inner.timings.delay;
            tokio::spawn(async move {
                sleep(delay).await;
                signal.fire_show();
            });
        }
    }

    /// Counts one request as finished.
    pub fn stop(&self) {
        let mut state = self.state();
        if state.in_flight == 0 {
            tracing::warn!("Loading signal stopped more often than started");
            return;
        }

        state.in_flight -= 1;
        if state.in_flight > 0 {
            return;
        }

        let Some(since) = state.visible_since else {
            return;
        };

        state.hide_epoch += 1;
        let remaining = self.inner.timings.min_visible.saturating_sub(since.elapsed());
        if remaining.is_zero() {
            self.hide(&mut state);
            return;
        }

        let epoch = state.hide_epoch;
        let signal = self.clone();
        tokio::spawn(async move {
            sleep(remaining).await;
            signal.fire_hide(epoch);
        });
    }

    /// Starts a request that ends when the returned guard is dropped.
    pub fn guard(&self) -> LoadingGuard {
        self.start();
        LoadingGuard {
            signal: self.clone(),
        }
    }

    fn fire_show(&self) {
        let mut state = self.state();
        state.show_pending = false;

        // The counter may have dropped back to zero while the timer was pending.
        if state.in_flight == 0 || state.visible_since.is_some() {
            return;
        }

        state.visible_since = Some(Instant::now());
        self.inner.visible.send_replace(true);
        tracing::debug!(in_flight = state.in_flight, "Loading indicator shown");
    }

    fn fire_hide(&self, epoch: u64) {
        let mut state = self.state();
        if state.hide_epoch != epoch || state.in_flight > 0 {
            return;
        }
        self.hide(&mut state);
    }

    fn hide(&self, state: &mut State) {
        state.visible_since = None;
        self.inner.visible.send_replace(false);
        tracing::debug!("Loading indicator hidden");
    }
}

impl Default for LoadingSignal {
    fn default() -> Self {
        Self::new(LoadingTimings::default())
    }
}

#[must_use = "the request only counts as in flight while the guard is alive"]
#[derive(Debug)]
pub struct LoadingGuard {
    signal: LoadingSignal,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.signal.stop();
    }
}
