//! Pass/drop sampling, decided before any field is encoded.
//!
//! A dropped call costs only the decision itself: no buffer is checked out
//! and no bytes are written.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::level::Level;

/// Pass/drop policy evaluated once per call.
///
/// Implementations are shared across every event derived from a logger (and
/// from all of that logger's clones), so any internal state must be safe to
/// mutate concurrently.
pub trait Sampler: Send + Sync {
    /// Decide whether a call at `level` should produce a record.
    fn sample(&self, level: Level) -> bool;
}

/// Deterministic 1-in-N sampler.
///
/// Increments a shared counter atomically per call and passes iff the
/// post-increment count modulo N equals 1, so calls 1, N+1, 2N+1, … pass.
/// Racing concurrent calls each receive a distinct counter value; no other
/// ordering is guaranteed.
#[derive(Debug, Default)]
pub struct BasicSampler {
    n: u64,
    counter: AtomicU64,
}

impl BasicSampler {
    /// Create a sampler passing one call in every `n`.
    ///
    /// `n` of 0 or 1 passes every call.
    pub fn new(n: u64) -> Self {
        Self {
            n,
            counter: AtomicU64::new(0),
        }
    }
}

impl Sampler for BasicSampler {
    fn sample(&self, _level: Level) -> bool {
        if self.n <= 1 {
            return true;
        }
        // fetch_add returns the pre-increment value, so a remainder of zero
        // corresponds to post-increment counts 1, N+1, 2N+1, ...
        self.counter.fetch_add(1, Ordering::Relaxed) % self.n == 0
    }
}
