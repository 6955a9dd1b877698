//! Shuffled play order
//!
//! A shuffle pass is a random permutation of the queued item ids, built once
//! with Fisher-Yates and then walked front to back. Ids are never reused by
//! the queue, so an order stays valid across edits as long as removals are
//! forwarded here.

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Remaining items of one shuffled pass over the queue
#[derive(Debug, Clone, Default)]
pub struct ShuffleOrder {
    /// Ids still to play, next first
    pending: Vec<i64>,
}

impl ShuffleOrder {
    /// Create an empty order
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass over `ids`, leaving out the item already playing
    pub fn reshuffle(&mut self, ids: impl IntoIterator<Item = i64>, current: Option<i64>) {
        self.reshuffle_with(&mut thread_rng(), ids, current);
    }

    /// `reshuffle` with a caller-supplied generator
    pub fn reshuffle_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        ids: impl IntoIterator<Item = i64>,
        current: Option<i64>,
    ) {
        self.pending = ids.into_iter().filter(|id| Some(*id) != current).collect();
        self.pending.shuffle(rng);
    }

    /// Add a newly queued item at a random place in the pass
    pub fn insert(&mut self, id: i64) {
        let index = thread_rng().gen_range(0..=self.pending.len());
        self.pending.insert(index, id);
    }

    /// Drop an item from the pass
    pub fn remove(&mut self, id: i64) {
        self.pending.retain(|pending| *pending != id);
    }

    /// Take the next item of the pass
    pub fn pop_next(&mut self) -> Option<i64> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    /// Ids still to play, next first
    pub fn remaining(&self) -> &[i64] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
