//! Refresh Use Case
//!
//! Exchanges a live refresh token for a new access token.

use std::sync::Arc;

use platform::clock::Clock;
use uuid::Uuid;

use crate::application::now_utc;
use crate::application::token::TokenIssuer;
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

pub struct RefreshInput {
    pub refresh_token: String,
}

pub struct RefreshUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl<U, T> RefreshUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            tokens,
            clock,
        }
    }

    /// Returns a new access token
    ///
    /// The signature must verify, and the stored fingerprint must be neither
    /// revoked nor expired.
    pub async fn execute(&self, input: RefreshInput) -> AuthResult<String> {
        let claims = self.tokens.verify_refresh_token(&input.refresh_token)?;
        let now = now_utc(self.clock.as_ref());

        let stored = self
            .token_repo
            .find_by_hash(&RefreshToken::fingerprint(&input.refresh_token))
            .await?
            .filter(|t| t.is_active(now))
            .ok_or(AuthError::TokenInvalid)?;

        let user_id = Uuid::parse_str(&claims.user_id)
            .map(UserId::from_uuid)
            .map_err(|_| AuthError::TokenInvalid)?;
        if user_id != stored.user_id {
            return Err(AuthError::TokenInvalid);
        }

        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .filter(|u| u.can_login())
            .ok_or(AuthError::TokenInvalid)?;

        tracing::debug!(user_id = %user.user_id, "Access token refreshed");
        self.tokens.issue_access_token(&user, now)
    }
}
