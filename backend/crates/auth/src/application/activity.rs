//! Activity Recording
//!
//! Audit entries are best effort: a failed write is logged and never fails
//! the request that triggered it.

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::domain::entity::activity_log::{ActivityAction, ActivityLog};
use crate::domain::repository::ActivityLogRepository;
use crate::domain::value_object::user_id::UserId;

/// Who performed an action, as seen by the HTTP layer
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Caller identity (client IP or `"unknown"`)
    pub identity: String,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(identity: impl Into<String>, user_agent: Option<String>) -> Self {
        Self {
            identity: identity.into(),
            user_agent,
        }
    }
}

/// Encrypt the user agent when a field key is configured
fn protect_user_agent(config: &AuthConfig, user_agent: Option<&str>) -> Option<String> {
    let user_agent = user_agent?;
    match config.field_encryption_key.as_deref() {
        None => Some(user_agent.to_string()),
        Some(key) => match platform::crypto::encrypt(user_agent, key) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping user agent from activity log");
                None
            }
        },
    }
}

pub(crate) async fn record_activity<L>(
    repo: &L,
    config: &AuthConfig,
    user_id: UserId,
    action: ActivityAction,
    ctx: &RequestContext,
    now: DateTime<Utc>,
) where
    L: ActivityLogRepository,
{
    let entry = ActivityLog::new(
        user_id,
        action,
        ctx.identity.clone(),
        protect_user_agent(config, ctx.user_agent.as_deref()),
        now,
    );

    if let Err(e) = repo.record(&entry).await {
        tracing::warn!(error = %e, %user_id, %action, "Failed to record activity");
    }
}
