//! Observation history backing both windowing pipelines
//!
//! Append-only store that answers "the last N observations" for any N,
//! clamped to the history collected so far. Physical eviction of old
//! observations is deferred and batched so `push` stays O(1) amortized.

use crate::models::Observation;

/// Ordered history of observations with length-bounded suffix views
#[derive(Debug, Default)]
pub struct WindowStore {
    history: Vec<Observation>,
    /// Number of observations physically evicted from the front
    evicted: u64,
}

impl WindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observation to the tail of history
    pub fn push(&mut self, obs: Observation) {
        self.history.push(obs);
    }

    /// Last `min(length, len)` observations, oldest first.
    ///
    /// Requests longer than the retained history clamp silently; this
    /// never panics and never reaches before the start of the stream.
    pub fn tail(&self, length: usize) -> &[Observation] {
        let n = length.min(self.history.len());
        &self.history[self.history.len() - n..]
    }

    /// Observations currently retained in memory
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Total observations ever appended, evicted ones included
    pub fn total_seen(&self) -> u64 {
        self.evicted + self.history.len() as u64
    }

    /// Drop observations older than the `keep` newest ones.
    ///
    /// Eviction only runs once the retained history exceeds twice `keep`,
    /// which amortizes the front drain across pushes. `tail(n)` results
    /// are unchanged for any `n <= keep`.
    pub fn evict_to(&mut self, keep: usize) {
        let keep = keep.max(1);
        if self.history.len() > keep.saturating_mul(2) {
            let excess = self.history.len() - keep;
            self.history.drain(..excess);
            self.evicted += excess as u64;
        }
    }

    /// Discard all history
    pub fn clear(&mut self) {
        self.history.clear();
        self.evicted = 0;
    }
}
