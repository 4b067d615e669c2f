//! User Entity
//!
//! Dashboard account, including the login-failure counter and lockout
//! window. All time-dependent methods take `now` so callers control the
//! clock.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::value_object::{
    email::Email, user_id::UserId, user_password::UserPassword, user_role::UserRole,
};

/// When repeated login failures lock an account, and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failures: u32,
    pub duration: Duration,
}

impl LockoutPolicy {
    pub fn chrono_duration(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.duration).unwrap_or(chrono::Duration::minutes(15))
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            duration: Duration::from_secs(15 * 60),
        }
    }
}

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, lower-cased login identifier
    pub email: Email,
    /// Display name, HTML-escaped at signup
    pub name: String,
    pub role: UserRole,
    pub password_hash: UserPassword,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    /// Consecutive failed logins
    pub failed_login_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: Email,
        name: String,
        role: UserRole,
        password_hash: UserPassword,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: UserId::new(),
            email,
            name,
            role,
            password_hash,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_login(&self) -> bool {
        self.is_active
    }

    /// True while `locked_until` lies in the future
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Count a failed login; returns true if this failure locked the account
    ///
    /// The counter is not cleared when a lock expires, so once the threshold
    /// has been reached every further failure re-locks immediately.
    pub fn record_failure(&mut self, now: DateTime<Utc>, policy: &LockoutPolicy) -> bool {
        self.failed_login_attempts = self.failed_login_attempts.saturating_add(1);
        self.updated_at = now;

        if self.failed_login_attempts >= policy.max_failures {
            self.locked_until = Some(now + policy.chrono_duration());
            return true;
        }
        false
    }

    /// Successful login: clear failures and lockout, stamp the login time
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.failed_login_attempts = 0;
        self.locked_until = None;
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}
