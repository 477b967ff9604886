//! Render Control

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Shared progress counter and cooperative cancellation flag. Workers check
/// it between units of work.
#[derive(Debug, Default)]
pub struct RenderControl {
    cancelled: AtomicBool,
    progress: AtomicUsize,
}

impl RenderControl {
    /// Returns a new `RenderControl`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Adds completed units of work. Returns the new total.
    ///
    /// * `n` - Units of work.
    pub fn add_progress(&self, n: usize) -> usize {
        self.progress.fetch_add(n, Ordering::Relaxed) + n
    }

    /// Returns the completed units of work.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Resets the progress counter for a new phase.
    pub fn reset_progress(&self) {
        self.progress.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn counts_across_threads() {
        let control = RenderControl::new();
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        control.add_progress(1);
                    }
                });
            }
        });
        assert_eq!(control.progress(), 400);
        control.reset_progress();
        assert_eq!(control.progress(), 0);
    }

    #[test]
    fn cancel_is_sticky() {
        let control = RenderControl::new();
        assert!(!control.is_cancelled());
        control.cancel();
        assert!(control.is_cancelled());
    }
}
