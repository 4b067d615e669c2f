//! Bearer Token Contract
//!
//! Claims carried by access and refresh tokens, and the signing
//! collaborator the use cases depend on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::entity::user::User;
use crate::domain::value_object::user_role::UserRole;
use crate::error::AuthResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Unique per refresh token, so two issued in the same second differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn for_user(user: &User, now: DateTime<Utc>, ttl: std::time::Duration) -> Self {
        let iat = now.timestamp();
        Self {
            user_id: user.user_id.to_string(),
            email: user.email.to_string(),
            role: user.role,
            iat,
            exp: iat.saturating_add(ttl.as_secs() as i64),
            jti: None,
        }
    }
}

/// Signs and verifies bearer tokens
pub trait TokenIssuer: Send + Sync {
    fn issue_access_token(&self, user: &User, now: DateTime<Utc>) -> AuthResult<String>;

    fn issue_refresh_token(&self, user: &User, now: DateTime<Utc>) -> AuthResult<String>;

    /// `TokenInvalid` on a bad signature or expired token
    fn verify_access_token(&self, token: &str) -> AuthResult<Claims>;

    fn verify_refresh_token(&self, token: &str) -> AuthResult<Claims>;
}

/// Access and refresh token issued together at login
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}
