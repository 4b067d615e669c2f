//! Refresh Token Entity
//!
//! Only the SHA-256 fingerprint of the issued token is persisted.

use chrono::{DateTime, Utc};
use kernel::id::RefreshTokenId;

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token_id: RefreshTokenId,
    pub user_id: UserId,
    /// Hex SHA-256 of the token string
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Record a newly issued token
    pub fn issue(user_id: UserId, token: &str, now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            token_id: RefreshTokenId::new(),
            user_id,
            token_hash: Self::fingerprint(token),
            expires_at: now + ttl,
            revoked_at: None,
            created_at: now,
        }
    }

    /// Storage key for a presented token
    pub fn fingerprint(token: &str) -> String {
        platform::crypto::hash(token)
    }

    /// Not revoked and not yet expired
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_stores_fingerprint_only() {
        let now = Utc::now();
        let token = RefreshToken::issue(UserId::new(), "eyJ.secret.token", now, chrono::Duration::days(30));

        assert_ne!(token.token_hash, "eyJ.secret.token");
        assert_eq!(token.token_hash.len(), 64);
        assert_eq!(token.token_hash, RefreshToken::fingerprint("eyJ.secret.token"));
        assert_eq!(token.expires_at, now + chrono::Duration::days(30));
    }

    #[test]
    fn test_is_active() {
        let now = Utc::now();
        let mut token = RefreshToken::issue(UserId::new(), "t", now, chrono::Duration::days(1));

        assert!(token.is_active(now));
        assert!(!token.is_active(now + chrono::Duration::days(1)));

        token.revoked_at = Some(now);
        assert!(!token.is_active(now));
    }
}
