//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{
    activity_log::ActivityLog,
    refresh_token::RefreshToken,
    user::{LockoutPolicy, User},
};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user; `EmailTaken` if the email is already registered
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by (lower-cased) email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if email exists
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Count one failed login and apply `policy` in a single atomic step
    ///
    /// Concurrent failures must each be counted; returns the user as stored
    /// after the increment.
    async fn record_login_failure(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        policy: &LockoutPolicy,
    ) -> AuthResult<User>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Store an issued token
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Find token by SHA-256 fingerprint
    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Mark a token revoked; returns false if no live token matched
    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> AuthResult<bool>;

    /// Clean up expired tokens
    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Activity log repository trait
#[trait_variant::make(ActivityLogRepository: Send)]
pub trait LocalActivityLogRepository {
    async fn record(&self, entry: &ActivityLog) -> AuthResult<()>;
}
