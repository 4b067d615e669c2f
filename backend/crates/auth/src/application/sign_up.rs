//! Sign Up Use Case
//!
//! Creates a new staff account.

use std::sync::Arc;

use platform::clock::Clock;
use platform::password::{check_strength, is_common_password};
use platform::sanitize::escape_html;

use crate::application::activity::{RequestContext, record_activity};
use crate::application::config::AuthConfig;
use crate::application::now_utc;
use crate::domain::entity::{activity_log::ActivityAction, user::User};
use crate::domain::repository::{ActivityLogRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const NAME_MAX_LENGTH: usize = 100;

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user: User,
}

/// Sign up use case
pub struct SignUpUseCase<U, L>
where
    U: UserRepository,
    L: ActivityLogRepository,
{
    user_repo: Arc<U>,
    activity_repo: Arc<L>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<U, L> SignUpUseCase<U, L>
where
    U: UserRepository,
    L: ActivityLogRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        activity_repo: Arc<L>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            activity_repo,
            clock,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput, ctx: &RequestContext) -> AuthResult<SignUpOutput> {
        let email = Email::new(&input.email)?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "Name must be at most {NAME_MAX_LENGTH} characters"
            )));
        }
        let name = escape_html(name);

        let assessment = check_strength(&input.password);
        if !assessment.is_valid {
            return Err(AuthError::WeakPassword(assessment.message));
        }
        if is_common_password(&input.password) {
            return Err(AuthError::WeakPassword(
                "Password is too common".to_string(),
            ));
        }

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let raw_password = RawPassword::new(input.password)?;
        let password_hash = self.hash_password(raw_password).await?;

        let now = now_utc(self.clock.as_ref());
        let user = User::new(email, name, UserRole::Staff, password_hash, now);

        // Unique index settles a race between two signups for the same email
        self.user_repo.create(&user).await?;

        record_activity(
            self.activity_repo.as_ref(),
            &self.config,
            user.user_id,
            ActivityAction::Signup,
            ctx,
            now,
        )
        .await;

        tracing::info!(user_id = %user.user_id, "User signed up");

        Ok(SignUpOutput { user })
    }

    async fn hash_password(&self, raw: RawPassword) -> AuthResult<UserPassword> {
        let pepper = self.config.password_pepper.clone();
        let params = self.config.hash_params.clone();
        tokio::task::spawn_blocking(move || UserPassword::from_raw(&raw, pepper.as_deref(), params))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
    }
}
