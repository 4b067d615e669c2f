//! CSRF Token Store
//!
//! Synchronizer-token protection: each session id maps to at most one live
//! token with an absolute expiry. Generating again for the same session
//! replaces the previous token.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::crypto::{DEFAULT_TOKEN_BYTES, constant_time_eq, generate_token};
use crate::sweep::Sweep;

/// Token lifetime (1 hour)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Default cap on the number of sessions holding a token
pub const DEFAULT_MAX_SESSIONS: usize = 100_000;

#[derive(Debug, Clone)]
struct CsrfEntry {
    token: String,
    expires_at_ms: u64,
}

/// In-memory CSRF token store
#[derive(Debug)]
pub struct CsrfProtection {
    entries: DashMap<String, CsrfEntry>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for CsrfProtection {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfProtection {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            ttl: DEFAULT_TOKEN_TTL,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the session cap (minimum 1)
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh token for `session_id`, replacing any previous one
    pub fn generate_token(&self, session_id: &str) -> String {
        let now = self.clock.now_ms();
        self.sweep_at(now);

        if !self.entries.contains_key(session_id) && self.entries.len() >= self.max_sessions {
            self.evict_soonest_expiring();
        }

        let token = generate_token(DEFAULT_TOKEN_BYTES);
        self.entries.insert(
            session_id.to_owned(),
            CsrfEntry {
                token: token.clone(),
                expires_at_ms: now.saturating_add(self.ttl.as_millis() as u64),
            },
        );
        token
    }

    /// Check `token` against the live token for `session_id`
    ///
    /// An expired entry is removed on the spot.
    pub fn verify_token(&self, session_id: &str, token: &str) -> bool {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(session_id) {
            None => return false,
            Some(entry) if now > entry.expires_at_ms => true,
            Some(entry) => return constant_time_eq(entry.token.as_bytes(), token.as_bytes()),
        };

        if expired {
            self.entries
                .remove_if(session_id, |_, entry| now > entry.expires_at_ms);
        }
        false
    }

    /// Drop the token for `session_id` (logout)
    pub fn invalidate(&self, session_id: &str) {
        self.entries.remove(session_id);
    }

    /// Number of sessions currently holding a token
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep_at(&self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.expires_at_ms);
        before.saturating_sub(self.entries.len())
    }

    fn evict_soonest_expiring(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at_ms)
            .map(|entry| entry.key().clone());

        if let Some(session_id) = victim {
            self.entries.remove(&session_id);
            tracing::debug!("Evicted CSRF entry at capacity");
        }
    }
}

impl Sweep for CsrfProtection {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn sweep(&self) -> usize {
        self.sweep_at(self.clock.now_ms())
    }
}

/// Random session identifier: 32 bytes, hex encoded
pub fn generate_session_id() -> String {
    generate_token(DEFAULT_TOKEN_BYTES)
}
