use std::future::pending;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Trailing-edge debouncer owned by a single event loop.
///
/// `schedule` replaces any pending value and restarts the quiet period; only
/// the last value scheduled within a window is ever delivered. No task is
/// spawned: the owner awaits [`Debouncer::fired`] (typically as one arm of a
/// `tokio::select!`) and receives the value once the deadline passes.
///
/// `fired` is cancel-safe. Dropping its future before the deadline leaves the
/// pending value in place, so the loop can re-create it on every iteration.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue `value`, discarding whatever was pending.
    pub fn schedule(&mut self, value: T) {
        self.pending = Some((Instant::now() + self.delay, value));
    }

    /// Drop the pending value without delivering it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// Resolves with the pending value once its quiet period has elapsed.
    ///
    /// Never resolves while nothing is pending.
    pub async fn fired(&mut self) -> T {
        let Some(deadline) = self.deadline() else {
            return pending().await;
        };
        sleep_until(deadline).await;
        match self.pending.take() {
            Some((_, value)) => value,
            None => pending().await,
        }
    }
}
