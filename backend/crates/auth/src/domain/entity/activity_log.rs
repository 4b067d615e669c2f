//! Activity Log Entity
//!
//! Audit trail of account events.

use chrono::{DateTime, Utc};
use derive_more::Display;
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ActivityAction {
    #[display("login")]
    Login,
    #[display("logout")]
    Logout,
    #[display("signup")]
    Signup,
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub log_id: Uuid,
    pub user_id: UserId,
    pub action: ActivityAction,
    pub ip_address: String,
    /// Encrypted payload when a field encryption key is configured
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(
        user_id: UserId,
        action: ActivityAction,
        ip_address: impl Into<String>,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4(),
            user_id,
            action,
            ip_address: ip_address.into(),
            user_agent,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes() {
        assert_eq!(ActivityAction::Login.to_string(), "login");
        assert_eq!(ActivityAction::Logout.to_string(), "logout");
        assert_eq!(ActivityAction::Signup.to_string(), "signup");
    }
}
