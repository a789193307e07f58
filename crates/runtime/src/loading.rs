use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Global "work in progress" indicator shared between the fetch pipeline and
/// whatever draws the spinner.
///
/// The indicator is visible while at least one [`LoadingGuard`] is alive.
/// Guards retract on drop, so every exit path (success, error, cancellation)
/// hides the indicator again.
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    active: Arc<AtomicUsize>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "the indicator retracts as soon as the guard is dropped"]
    pub fn show(&self) -> LoadingGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.active_count() > 0
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct LoadingGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
