//! Sign In Use Case
//!
//! Authenticates a user by email and password and issues a token pair.
//!
//! Order of checks:
//! 1. login rate limit for the caller identity (storage untouched on reject)
//! 2. email format
//! 3. account lookup; unknown and inactive accounts fail identically
//! 4. lockout window
//! 5. password; a mismatch counts toward the lockout threshold

use std::sync::Arc;

use platform::clock::Clock;
use platform::rate_limit::RateLimiter;

use crate::application::activity::{RequestContext, record_activity};
use crate::application::config::AuthConfig;
use crate::application::now_utc;
use crate::application::token::{TokenIssuer, TokenPair};
use crate::domain::entity::{activity_log::ActivityAction, refresh_token::RefreshToken, user::User};
use crate::domain::repository::{ActivityLogRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user: User,
    pub tokens: TokenPair,
}

/// Sign in use case
pub struct SignInUseCase<U, T, L>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    L: ActivityLogRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    activity_repo: Arc<L>,
    tokens: Arc<dyn TokenIssuer>,
    login_limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<U, T, L> SignInUseCase<U, T, L>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    L: ActivityLogRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        activity_repo: Arc<L>,
        tokens: Arc<dyn TokenIssuer>,
        login_limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            activity_repo,
            tokens,
            login_limiter,
            clock,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput, ctx: &RequestContext) -> AuthResult<SignInOutput> {
        let limit = self.login_limiter.check(&ctx.identity);
        if !limit.allowed {
            tracing::warn!(identity = %ctx.identity, "Login rate limit exceeded");
            return Err(AuthError::RateLimitExceeded {
                retry_after_secs: limit.retry_after.as_secs_f64().ceil() as u64,
            });
        }

        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        let email = Email::new(&input.email)?;
        let raw_password = RawPassword::new(input.password)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .filter(User::can_login)
            .ok_or(AuthError::InvalidCredentials)?;

        let now = now_utc(self.clock.as_ref());
        if user.is_locked(now) {
            return Err(AuthError::AccountLocked);
        }

        if !self.verify_password(&user, raw_password).await? {
            let counted = self
                .user_repo
                .record_login_failure(&user.user_id, now, &self.config.lockout)
                .await?;
            if counted.is_locked(now) {
                tracing::warn!(
                    user_id = %counted.user_id,
                    attempts = counted.failed_login_attempts,
                    "Account locked after repeated login failures"
                );
            }
            return Err(AuthError::InvalidCredentials);
        }

        user.record_login(now);
        self.user_repo.update(&user).await?;
        self.login_limiter.reset(&ctx.identity);

        let tokens = TokenPair {
            access_token: self.tokens.issue_access_token(&user, now)?,
            refresh_token: self.tokens.issue_refresh_token(&user, now)?,
        };
        let stored = RefreshToken::issue(
            user.user_id,
            &tokens.refresh_token,
            now,
            self.config.refresh_token_ttl_chrono(),
        );
        self.token_repo.create(&stored).await?;

        record_activity(
            self.activity_repo.as_ref(),
            &self.config,
            user.user_id,
            ActivityAction::Login,
            ctx,
            now,
        )
        .await;

        tracing::info!(user_id = %user.user_id, role = %user.role, "User signed in");

        Ok(SignInOutput { user, tokens })
    }

    /// Argon2 verification runs on the blocking pool
    async fn verify_password(&self, user: &User, raw: RawPassword) -> AuthResult<bool> {
        let hash = user.password_hash.clone();
        let pepper = self.config.password_pepper.clone();
        tokio::task::spawn_blocking(move || hash.verify(&raw, pepper.as_deref()))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}
