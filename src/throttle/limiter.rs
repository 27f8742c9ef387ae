//! Per-identifier fixed-window request counters.

use dashmap::{DashMap, mapref::entry::Entry};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Counter state for one identifier within one window.
#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window rate limiter keyed by an opaque caller identifier
/// (typically the client IP).
///
/// Each identifier moves through Idle → Counting → Exhausted and back to
/// Idle when its window expires. The check-and-increment in
/// [`Self::is_allowed`] happens under the shard lock of the entry, so
/// concurrent requests for the same identifier can never overshoot the cap.
///
/// Construct once at startup and share via `Arc`; expired records are
/// reclaimed by [`Self::cleanup`], driven by a periodic background task (see
/// [`sweep_task`]). State is process-local by design: a horizontally scaled
/// deployment gets one independent window per instance.
///
/// # Examples
///
/// ```
/// use replyguard::FixedWindowLimiter;
/// use std::time::Duration;
///
/// let limiter = FixedWindowLimiter::new(3, Duration::from_secs(1));
/// assert!(limiter.is_allowed("10.0.0.1"));
/// assert!(limiter.is_allowed("10.0.0.1"));
/// assert_eq!(limiter.remaining_requests("10.0.0.1"), 1);
/// ```
#[derive(Debug)]
pub struct FixedWindowLimiter {
    records: DashMap<String, RateLimitRecord>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    /// Creates a limiter allowing `max_requests` per identifier per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            records: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// The configured per-window request cap.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// The configured window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Checks whether a request from `id` is allowed, counting it if so.
    ///
    /// A fresh record (count 1) is created when the identifier is unknown or
    /// its window has expired. Within a live window the count increments up
    /// to the cap; at the cap the call returns `false` without mutating
    /// state, so hammering a exhausted identifier neither extends nor resets
    /// its window.
    pub fn is_allowed(&self, id: &str) -> bool {
        if self.max_requests == 0 {
            return false;
        }

        let now = Instant::now();
        match self.records.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if now >= record.reset_at {
                    *record = RateLimitRecord {
                        count: 1,
                        reset_at: now + self.window,
                    };
                    true
                } else if record.count < self.max_requests {
                    record.count += 1;
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitRecord {
                    count: 1,
                    reset_at: now + self.window,
                });
                true
            }
        }
    }

    /// Remaining quota for `id` in its current window.
    ///
    /// Absent or expired identifiers report the full quota.
    pub fn remaining_requests(&self, id: &str) -> u32 {
        let now = Instant::now();
        match self.records.get(id) {
            Some(record) if now < record.reset_at => {
                self.max_requests.saturating_sub(record.count)
            }
            _ => self.max_requests,
        }
    }

    /// Time until the current window for `id` resets.
    ///
    /// Zero when the identifier has no live window.
    pub fn retry_after(&self, id: &str) -> Duration {
        let now = Instant::now();
        match self.records.get(id) {
            Some(record) if now < record.reset_at => record.reset_at - now,
            _ => Duration::ZERO,
        }
    }

    /// Drops every record whose window has expired.
    ///
    /// Purely a memory bound; correctness does not depend on it running,
    /// since expired records are replaced lazily by [`Self::is_allowed`].
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.records.retain(|_, record| now < record.reset_at);
    }

    /// Number of identifiers currently tracked, including expired ones not
    /// yet swept.
    pub fn tracked_identifiers(&self) -> usize {
        self.records.len()
    }
}

/// Background task that periodically sweeps expired limiter records.
///
/// Spawn once per limiter instance and wrap the handle in an
/// `AbortOnDropHandle` so the sweep stops with its owner.
pub async fn sweep_task(limiter: Arc<FixedWindowLimiter>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        limiter.cleanup();
        tracing::debug!(
            tracked = limiter.tracked_identifiers(),
            "Swept expired rate-limit records"
        );
    }
}
