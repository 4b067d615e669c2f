//! Sign Out Use Case
//!
//! Revokes the presented refresh token.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::activity::{RequestContext, record_activity};
use crate::application::config::AuthConfig;
use crate::application::now_utc;
use crate::domain::entity::{activity_log::ActivityAction, refresh_token::RefreshToken};
use crate::domain::repository::{ActivityLogRepository, RefreshTokenRepository};
use crate::error::AuthResult;

pub struct SignOutInput {
    pub refresh_token: Option<String>,
}

/// Sign out use case
pub struct SignOutUseCase<T, L>
where
    T: RefreshTokenRepository,
    L: ActivityLogRepository,
{
    token_repo: Arc<T>,
    activity_repo: Arc<L>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<T, L> SignOutUseCase<T, L>
where
    T: RefreshTokenRepository,
    L: ActivityLogRepository,
{
    pub fn new(
        token_repo: Arc<T>,
        activity_repo: Arc<L>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            token_repo,
            activity_repo,
            clock,
            config,
        }
    }

    /// Returns true if a live token was revoked
    ///
    /// Unknown or already-revoked tokens are not an error.
    pub async fn execute(&self, input: SignOutInput, ctx: &RequestContext) -> AuthResult<bool> {
        let Some(token) = input.refresh_token else {
            return Ok(false);
        };

        let now = now_utc(self.clock.as_ref());
        let hash = RefreshToken::fingerprint(&token);
        let Some(stored) = self.token_repo.find_by_hash(&hash).await? else {
            return Ok(false);
        };

        let revoked = self.token_repo.revoke(&hash, now).await?;
        if revoked {
            record_activity(
                self.activity_repo.as_ref(),
                &self.config,
                stored.user_id,
                ActivityAction::Logout,
                ctx,
                now,
            )
            .await;
            tracing::info!(user_id = %stored.user_id, "User signed out");
        }

        Ok(revoked)
    }
}
