//! Rate Limiting
//!
//! Trailing-window request counter keyed by caller identity.
//!
//! Each identity owns an ordered list of the timestamps of its accepted
//! requests. On every check the list is pruned to the trailing window, the
//! remaining entries are counted, and the request is admitted only if the
//! count is below `max_requests`. Rejected requests are not recorded.
//!
//! One limiter is built per protected surface (login, general API), so
//! unrelated endpoints never share a budget.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::sweep::Sweep;

/// Default cap on the number of identities tracked by one limiter
pub const DEFAULT_MAX_TRACKED_IDENTITIES: usize = 100_000;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::api()
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_millis(window_ms),
        }
    }

    /// Login attempts: 5 per 15 minutes
    pub fn login() -> Self {
        Self::new(5, 15 * 60 * 1000)
    }

    /// General API traffic: 100 per 15 minutes
    pub fn api() -> Self {
        Self::new(100, 15 * 60 * 1000)
    }

    pub fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests still available in the current window
    pub remaining: u32,
    /// When the oldest counted request leaves the window
    pub reset_at_ms: u64,
    /// How long a rejected caller should wait; zero when allowed
    pub retry_after: Duration,
}

/// In-memory trailing-window rate limiter
///
/// ## Concurrency
/// Windows live in a [`DashMap`]. The prune, count and append for one
/// identity happen while holding that identity's entry lock, so two
/// concurrent requests can never both take the last free slot.
///
/// ## Memory
/// Windows are pruned on every access, emptied windows are dropped by
/// [`RateLimiter::sweep`], and the number of tracked identities is capped:
/// a new identity arriving at the cap triggers a sweep and, if that frees
/// nothing, evicts the identity that has been quiet the longest. The cap is
/// soft under concurrent arrivals of new identities.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, VecDeque<u64>>,
    clock: Arc<dyn Clock>,
    max_tracked: usize,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            windows: DashMap::new(),
            clock,
            max_tracked: DEFAULT_MAX_TRACKED_IDENTITIES,
        }
    }

    /// Override the cap on tracked identities (minimum 1)
    pub fn with_max_tracked(mut self, max_tracked: usize) -> Self {
        self.max_tracked = max_tracked.max(1);
        self
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or reject one request from `identity`
    pub fn is_allowed(&self, identity: &str) -> bool {
        self.check(identity).allowed
    }

    /// Admit or reject one request, reporting the remaining budget
    pub fn check(&self, identity: &str) -> RateLimitResult {
        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms();
        let max = self.config.max_requests;

        if !self.windows.contains_key(identity) {
            self.make_room(now);
        }

        let mut window = self.windows.entry(identity.to_owned()).or_default();
        prune(&mut window, now, window_ms);

        let count = u32::try_from(window.len()).unwrap_or(u32::MAX);
        if count >= max {
            let reset_at_ms = window.front().map_or(now, |&oldest| oldest + window_ms);
            tracing::debug!(identity, count, max, "Rate limit exceeded");
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at_ms,
                retry_after: Duration::from_millis(reset_at_ms.saturating_sub(now)),
            };
        }

        window.push_back(now);
        let oldest = window.front().copied().unwrap_or(now);

        RateLimitResult {
            allowed: true,
            remaining: max - count - 1,
            reset_at_ms: oldest + window_ms,
            retry_after: Duration::ZERO,
        }
    }

    /// Forget all history for `identity`
    pub fn reset(&self, identity: &str) {
        self.windows.remove(identity);
    }

    /// Number of identities currently holding a window
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    fn sweep_at(&self, now: u64) -> usize {
        let window_ms = self.config.window_ms();
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            prune(window, now, window_ms);
            !window.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    fn make_room(&self, now: u64) {
        if self.windows.len() < self.max_tracked {
            return;
        }
        self.sweep_at(now);
        if self.windows.len() < self.max_tracked {
            return;
        }

        let quietest = self
            .windows
            .iter()
            .min_by_key(|entry| entry.value().back().copied().unwrap_or(0))
            .map(|entry| entry.key().clone());

        if let Some(identity) = quietest {
            self.windows.remove(&identity);
            tracing::debug!(identity = %identity, "Evicted rate limit window at capacity");
        }
    }
}

impl Sweep for RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limiter"
    }

    fn sweep(&self) -> usize {
        self.sweep_at(self.clock.now_ms())
    }
}

/// Keep only timestamps with `now - t < window_ms`
fn prune(window: &mut VecDeque<u64>, now: u64, window_ms: u64) {
    window.retain(|&t| now.saturating_sub(t) < window_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn limiter(max: u32, window_ms: u64) -> (RateLimiter, MockClock) {
        let clock = MockClock::new(1_000_000);
        let limiter =
            RateLimiter::with_clock(RateLimitConfig::new(max, window_ms), Arc::new(clock.clone()));
        (limiter, clock)
    }

    #[test]
    fn test_presets() {
        assert_eq!(RateLimitConfig::login().max_requests, 5);
        assert_eq!(RateLimitConfig::login().window_ms(), 900_000);
        assert_eq!(RateLimitConfig::api().max_requests, 100);
        assert_eq!(RateLimitConfig::default(), RateLimitConfig::api());
    }

    #[test]
    fn test_allows_max_then_rejects() {
        let (limiter, _clock) = limiter(5, 60_000);
        for _ in 0..5 {
            assert!(limiter.is_allowed("10.0.0.1"));
        }
        assert!(!limiter.is_allowed("10.0.0.1"));
        assert!(!limiter.is_allowed("10.0.0.1"));
    }

    #[test]
    fn test_rejection_does_not_record() {
        let (limiter, clock) = limiter(1, 1_000);
        assert!(limiter.is_allowed("a"));
        clock.advance(Duration::from_millis(500));
        assert!(!limiter.is_allowed("a"));
        // Only the first request counts, so the slot frees 1s after it.
        clock.advance(Duration::from_millis(500));
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn test_window_boundary_is_strict() {
        let (limiter, clock) = limiter(1, 1_000);
        assert!(limiter.is_allowed("a"));
        clock.advance(Duration::from_millis(999));
        assert!(!limiter.is_allowed("a"));
        clock.advance(Duration::from_millis(1));
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn test_recovers_after_window_without_reset() {
        let (limiter, clock) = limiter(3, 15 * 60 * 1000);
        for _ in 0..3 {
            assert!(limiter.is_allowed("user"));
        }
        assert!(!limiter.is_allowed("user"));
        clock.advance(Duration::from_secs(15 * 60 + 1));
        assert!(limiter.is_allowed("user"));
    }

    #[test]
    fn test_reset_clears_history() {
        let (limiter, _clock) = limiter(2, 60_000);
        assert!(limiter.is_allowed("ip"));
        assert!(limiter.is_allowed("ip"));
        assert!(!limiter.is_allowed("ip"));
        limiter.reset("ip");
        assert!(limiter.is_allowed("ip"));
    }

    #[test]
    fn test_identities_are_independent() {
        let (limiter, _clock) = limiter(1, 60_000);
        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        assert!(limiter.is_allowed("b"));
    }

    #[test]
    fn test_check_reports_remaining_and_retry_after() {
        let (limiter, clock) = limiter(2, 10_000);
        let first = limiter.check("x");
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.reset_at_ms, 1_010_000);

        clock.advance(Duration::from_secs(4));
        assert_eq!(limiter.check("x").remaining, 0);

        let rejected = limiter.check("x");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.retry_after, Duration::from_secs(6));
    }

    #[test]
    fn test_zero_budget_rejects_everything() {
        let (limiter, _clock) = limiter(0, 1_000);
        assert!(!limiter.is_allowed("a"));
    }

    #[test]
    fn test_sweep_drops_stale_identities() {
        let (limiter, clock) = limiter(5, 1_000);
        limiter.is_allowed("a");
        limiter.is_allowed("b");
        clock.advance(Duration::from_millis(600));
        limiter.is_allowed("c");
        clock.advance(Duration::from_millis(500));

        assert_eq!(limiter.sweep(), 2);
        assert_eq!(limiter.tracked_identities(), 1);
    }

    #[test]
    fn test_capacity_evicts_quietest_identity() {
        let (limiter, clock) = limiter(5, 60_000);
        let limiter = limiter.with_max_tracked(2);

        limiter.is_allowed("old");
        clock.advance(Duration::from_millis(10));
        limiter.is_allowed("recent");
        clock.advance(Duration::from_millis(10));
        limiter.is_allowed("new");

        assert_eq!(limiter.tracked_identities(), 2);
        // "old" lost its history, so it has a full budget again.
        assert_eq!(limiter.check("recent").remaining, 3);
        assert!(limiter.windows.get("old").is_none());
    }

    #[test]
    fn test_concurrent_requests_never_exceed_budget() {
        let (limiter, _clock) = limiter(5, 60_000);
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.is_allowed("shared"))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&allowed| allowed)
            .count();
        assert_eq!(admitted, 5);
    }
}
