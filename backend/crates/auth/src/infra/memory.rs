//! In-Memory Repository Implementations
//!
//! Backs tests and local runs without a database. Email uniqueness is
//! enforced through a separate index map so two concurrent signups for the
//! same address cannot both succeed.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::{Arc, RwLock};

use crate::domain::entity::{
    activity_log::ActivityLog,
    refresh_token::RefreshToken,
    user::{LockoutPolicy, User},
};
use crate::domain::repository::{ActivityLogRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Default)]
struct Store {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
    refresh_tokens: DashMap<String, RefreshToken>,
    activity: RwLock<Vec<ActivityLog>>,
}

/// Process-local auth repository; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthRepository {
    store: Arc<Store>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded activity, oldest first
    pub fn activity(&self) -> Vec<ActivityLog> {
        self.store
            .activity
            .read()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl UserRepository for InMemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        match self.store.emails.entry(user.email.as_str().to_string()) {
            Entry::Occupied(_) => Err(AuthError::EmailTaken),
            Entry::Vacant(slot) => {
                self.store.users.insert(user.user_id, user.clone());
                slot.insert(user.user_id);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.store.users.get(user_id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let Some(user_id) = self.store.emails.get(email.as_str()).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.store.users.get(&user_id).map(|u| u.clone()))
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.store.emails.contains_key(email.as_str()))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        match self.store.users.get_mut(&user.user_id) {
            Some(mut stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(AuthError::Internal(format!(
                "update of unknown user {}",
                user.user_id
            ))),
        }
    }

    async fn record_login_failure(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        policy: &LockoutPolicy,
    ) -> AuthResult<User> {
        // The shard write lock is held across read-modify-write
        match self.store.users.get_mut(user_id) {
            Some(mut stored) => {
                stored.record_failure(now, policy);
                Ok(stored.clone())
            }
            None => Err(AuthError::Internal(format!(
                "login failure for unknown user {user_id}"
            ))),
        }
    }
}

impl RefreshTokenRepository for InMemoryAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.store
            .refresh_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.store.refresh_tokens.get(token_hash).map(|t| t.clone()))
    }

    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> AuthResult<bool> {
        Ok(match self.store.refresh_tokens.get_mut(token_hash) {
            Some(mut token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(at);
                true
            }
            _ => false,
        })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let before = self.store.refresh_tokens.len();
        self.store.refresh_tokens.retain(|_, t| t.expires_at >= now);
        Ok(before.saturating_sub(self.store.refresh_tokens.len()) as u64)
    }
}

impl ActivityLogRepository for InMemoryAuthRepository {
    async fn record(&self, entry: &ActivityLog) -> AuthResult<()> {
        self.store
            .activity
            .write()
            .map_err(|_| AuthError::Internal("activity log lock poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::HashParams;

    use crate::domain::entity::activity_log::ActivityAction;
    use crate::domain::value_object::{
        user_password::{RawPassword, UserPassword},
        user_role::UserRole,
    };

    fn user(email: &str) -> User {
        let raw = RawPassword::new("Abcdefg1!".to_string()).unwrap();
        let hash =
            UserPassword::from_raw(&raw, None, HashParams::new(1024, 1, 1, None).unwrap()).unwrap();
        User::new(
            Email::new(email).unwrap(),
            "Test".to_string(),
            UserRole::Staff,
            hash,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryAuthRepository::new();
        let user = user("a@example.com");
        UserRepository::create(&repo, &user).await.unwrap();

        let by_email = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(by_email.user_id, user.user_id);
        assert!(repo.find_by_id(&user.user_id).await.unwrap().is_some());
        assert!(repo.exists_by_email(&user.email).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryAuthRepository::new();
        UserRepository::create(&repo, &user("dup@example.com")).await.unwrap();

        let err = UserRepository::create(&repo, &user("DUP@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_concurrent_signups_one_wins() {
        let repo = InMemoryAuthRepository::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            let user = user("race@example.com");
            handles.push(tokio::spawn(async move {
                UserRepository::create(&repo, &user).await.is_ok()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_login_failures_all_counted() {
        let repo = InMemoryAuthRepository::new();
        let user = user("locked@example.com");
        UserRepository::create(&repo, &user).await.unwrap();
        let now = Utc::now();
        let policy = LockoutPolicy::default();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                let user_id = user.user_id;
                tokio::spawn(async move {
                    repo.record_login_failure(&user_id, now, &policy).await.unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 16);
        assert!(stored.is_locked(now));
    }

    #[tokio::test]
    async fn test_login_failure_for_unknown_user() {
        let repo = InMemoryAuthRepository::new();
        let err = repo
            .record_login_failure(&UserId::new(), Utc::now(), &LockoutPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn test_refresh_token_revoke_once() {
        let repo = InMemoryAuthRepository::new();
        let now = Utc::now();
        let token = RefreshToken::issue(UserId::new(), "tok", now, chrono::Duration::days(1));
        RefreshTokenRepository::create(&repo, &token).await.unwrap();

        assert!(repo.revoke(&token.token_hash, now).await.unwrap());
        assert!(!repo.revoke(&token.token_hash, now).await.unwrap());
        let stored = repo.find_by_hash(&token.token_hash).await.unwrap().unwrap();
        assert!(!stored.is_active(now));
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let repo = InMemoryAuthRepository::new();
        let now = Utc::now();
        let old = RefreshToken::issue(UserId::new(), "old", now - chrono::Duration::days(2), chrono::Duration::days(1));
        let fresh = RefreshToken::issue(UserId::new(), "fresh", now, chrono::Duration::days(1));
        RefreshTokenRepository::create(&repo, &old).await.unwrap();
        RefreshTokenRepository::create(&repo, &fresh).await.unwrap();

        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert!(repo.find_by_hash(&fresh.token_hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_activity_recorded_in_order() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::new();
        for action in [ActivityAction::Signup, ActivityAction::Login] {
            repo.record(&ActivityLog::new(user_id, action, "10.0.0.1", None, Utc::now()))
                .await
                .unwrap();
        }

        let actions: Vec<_> = repo.activity().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![ActivityAction::Signup, ActivityAction::Login]);
    }
}
