//! Coalesces bursts of file-system events per path.
//!
//! Editors usually emit several events for a single save (truncate, write,
//! rename, chmod); each path is reported once after it has been quiet for the
//! debounce delay.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe path debouncer.
pub(crate) struct Debouncer {
    pending: Mutex<HashMap<PathBuf, Instant>>,
    delay: Duration,
}

impl Debouncer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            delay,
        }
    }

    /// Record a change of `path`, pushing its deadline back.
    ///
    /// Called from the notify callback thread.
    pub(crate) fn record(&self, path: PathBuf) {
        let deadline = Instant::now() + self.delay;
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, deadline);
    }

    /// Remove and return the paths whose deadline has passed, sorted.
    pub(crate) fn drain_ready(&self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let mut ready = Vec::new();
        pending.retain(|path, deadline| {
            if *deadline <= now {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }
}
