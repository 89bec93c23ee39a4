//! Keyed trailing-edge debouncer over the tokio clock.
//!
//! One pending timer per key; every trigger aborts and restarts the
//! key's timer, so the action runs once after the last event in a
//! burst.
//!
//! This sits at the event edge, in front of the workspace. A drag
//! handler re-triggers [`DebounceKey::Reorder`] with the latest target
//! order and the scheduled action calls `LayerWorkspace::reorder`, so
//! a burst of drag events reaches the map once. Search input, viewport
//! resize, and symbology sliders wire up the same way under their own
//! keys.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Event classes that share a debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebounceKey {
    Search,
    Resize,
    Reorder,
    Slider,
}

/// Per-key trailing-edge delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceDelays {
    pub search: Duration,
    pub resize: Duration,
    pub reorder: Duration,
    pub slider: Duration,
}

impl Default for DebounceDelays {
    fn default() -> Self {
        Self {
            search: Duration::from_millis(250),
            resize: Duration::from_millis(250),
            reorder: Duration::from_millis(100),
            slider: Duration::from_millis(300),
        }
    }
}

impl DebounceDelays {
    fn for_key(&self, key: DebounceKey) -> Duration {
        match key {
            DebounceKey::Search => self.search,
            DebounceKey::Resize => self.resize,
            DebounceKey::Reorder => self.reorder,
            DebounceKey::Slider => self.slider,
        }
    }
}

/// Trailing-edge debouncer. Must be used inside a tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    delays: DebounceDelays,
    pending: HashMap<DebounceKey, JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delays(delays: DebounceDelays) -> Self {
        Self {
            delays,
            pending: HashMap::new(),
        }
    }

    /// Schedule `action` to run after the key's delay, cancelling any
    /// earlier pending action for the same key.
    pub fn trigger<F>(&mut self, key: DebounceKey, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(previous) = self.pending.remove(&key) {
            previous.abort();
        }
        let delay = self.delays.for_key(key);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
        self.pending.insert(key, handle);
    }

    /// Drop any pending action for the key without running it.
    pub fn cancel(&mut self, key: DebounceKey) {
        if let Some(handle) = self.pending.remove(&key) {
            handle.abort();
        }
    }

    pub fn is_pending(&self, key: DebounceKey) -> bool {
        self.pending
            .get(&key)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        for handle in self.pending.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_action_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();

        for _ in 0..5 {
            let count = Arc::clone(&count);
            debouncer.trigger(DebounceKey::Reorder, move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();

        for key in [DebounceKey::Search, DebounceKey::Slider] {
            let count = Arc::clone(&count);
            debouncer.trigger(key, move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_action() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();

        {
            let count = Arc::clone(&count);
            debouncer.trigger(DebounceKey::Resize, move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(debouncer.is_pending(DebounceKey::Resize));
        debouncer.cancel(DebounceKey::Resize);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending(DebounceKey::Resize));
    }
}
