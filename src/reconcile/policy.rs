//! Timing and retry budget for the reconciliation loop.
//!
//! This module provides [`ReconcilePolicy`], the knobs for how long and
//! how often the reconciler looks at the downloads directory.
//!
//! # Overview
//!
//! One reconciliation runs up to `max_retries` attempts. Within an
//! attempt the directory is polled up to `poll_iterations` times with
//! `poll_interval` sleeps in between; the interval paces the loop to
//! catch download *completion* rather than spinning on the listing.
//! Between attempts that ended without a usable candidate the reconciler
//! sleeps `attempt_backoff` plus jitter, so repeated invocations do not
//! phase-lock with periodic server behavior.
//!
//! Everything is bounded: [`ReconcilePolicy::total_poll_budget`] gives
//! the worst-case time spent inside poll sleeps, which is the dominant
//! term of a fruitless reconciliation.

use std::time::Duration;

use rand::Rng;

/// Default maximum reconciliation attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default polls per attempt.
pub const DEFAULT_POLL_ITERATIONS: u32 = 10;

/// Default sleep between polls (1 second).
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default wait between attempts (3 seconds).
const DEFAULT_ATTEMPT_BACKOFF: Duration = Duration::from_secs(3);

/// Maximum jitter added to the attempt backoff (500ms).
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Configuration for reconciliation pacing and retry budget.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `poll_iterations`: 10
/// - `poll_interval`: 1 second
/// - `attempt_backoff`: 3 seconds
///
/// With defaults, a reconciliation that never sees a file spends at most
/// 3 × 10 × 1s = 30s in poll sleeps before giving up.
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_retries: u32,

    /// Directory polls per attempt.
    poll_iterations: u32,

    /// Sleep between polls.
    poll_interval: Duration,

    /// Base wait between attempts (jitter is added on top).
    attempt_backoff: Duration,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            poll_iterations: DEFAULT_POLL_ITERATIONS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            attempt_backoff: DEFAULT_ATTEMPT_BACKOFF,
        }
    }
}

impl ReconcilePolicy {
    /// Creates a policy with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy with a custom attempt count, using defaults for
    /// the rest. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            ..Self::default()
        }
    }

    /// Overrides the poll loop shape. Zero iterations clamp to 1; a zero
    /// interval falls back to the default so the loop never busy-spins.
    #[must_use]
    pub fn with_polling(mut self, poll_iterations: u32, poll_interval: Duration) -> Self {
        self.poll_iterations = poll_iterations.max(1);
        self.poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        self
    }

    /// Overrides the base wait between attempts.
    #[must_use]
    pub fn with_attempt_backoff(mut self, attempt_backoff: Duration) -> Self {
        self.attempt_backoff = attempt_backoff;
        self
    }

    /// Maximum number of attempts configured.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Directory polls per attempt.
    #[must_use]
    pub fn poll_iterations(&self) -> u32 {
        self.poll_iterations
    }

    /// Sleep between polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Worst-case time spent inside poll sleeps across all attempts.
    ///
    /// The dominant term of a fruitless reconciliation; backoff sleeps
    /// between attempts add at most
    /// `(max_retries - 1) × (attempt_backoff + 500ms)` on top.
    #[must_use]
    pub fn total_poll_budget(&self) -> Duration {
        self.poll_interval * self.poll_iterations * self.max_retries
    }

    /// The wait before the next attempt: base backoff plus random jitter.
    ///
    /// Jitter keeps repeated runs from phase-locking with periodic
    /// server behavior when several reconciliations fail in lockstep.
    #[must_use]
    pub fn backoff_with_jitter(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
        self.attempt_backoff + Duration::from_millis(jitter_ms)
    }
}
