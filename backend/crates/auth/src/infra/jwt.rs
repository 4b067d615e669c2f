//! HS256 JWT Token Issuer
//!
//! `iat`/`exp` are stamped from the caller's `now`, and expiry is checked
//! against the issuer's [`Clock`], never the wall clock directly. Issuing and
//! verifying therefore agree on time when a test clock is injected.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use platform::clock::{Clock, SystemClock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::application::config::AuthConfig;
use crate::application::now_utc;
use crate::application::token::{Claims, TokenIssuer};
use crate::domain::entity::user::User;
use crate::error::{AuthError, AuthResult};

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::TokenInvalid
            })?;

        if claims.exp <= now.timestamp() {
            tracing::debug!(exp = claims.exp, "Token expired");
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }
}

/// Access and refresh tokens signed with separate secrets
pub struct JwtTokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    clock: Arc<dyn Clock>,
}

impl JwtTokenIssuer {
    /// Issuer validating expiry against the system clock
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            access: SigningKeys::new(&config.jwt_secret, config.access_token_ttl),
            refresh: SigningKeys::new(&config.refresh_token_secret, config.refresh_token_ttl),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        now_utc(self.clock.as_ref())
    }
}

impl fmt::Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue_access_token(&self, user: &User, now: DateTime<Utc>) -> AuthResult<String> {
        self.access
            .sign(&Claims::for_user(user, now, self.access.ttl))
    }

    fn issue_refresh_token(&self, user: &User, now: DateTime<Utc>) -> AuthResult<String> {
        let claims = Claims {
            jti: Some(uuid::Uuid::new_v4().to_string()),
            ..Claims::for_user(user, now, self.refresh.ttl)
        };
        self.refresh.sign(&claims)
    }

    fn verify_access_token(&self, token: &str) -> AuthResult<Claims> {
        self.access.verify(token, self.now())
    }

    fn verify_refresh_token(&self, token: &str) -> AuthResult<Claims> {
        self.refresh.verify(token, self.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::clock::MockClock;
    use platform::password::HashParams;

    use crate::domain::value_object::{
        email::Email,
        user_password::{RawPassword, UserPassword},
        user_role::UserRole,
    };

    fn user() -> User {
        let raw = RawPassword::new("Abcdefg1!".to_string()).unwrap();
        let hash =
            UserPassword::from_raw(&raw, None, HashParams::new(1024, 1, 1, None).unwrap()).unwrap();
        User::new(
            Email::new("admin@example.com").unwrap(),
            "Admin".to_string(),
            UserRole::Admin,
            hash,
            Utc::now(),
        )
    }

    #[test]
    fn test_access_token_roundtrip_claims() {
        let issuer = JwtTokenIssuer::new(&AuthConfig::development());
        let user = user();
        let now = Utc::now();

        let token = issuer.issue_access_token(&user, now).unwrap();
        let claims = issuer.verify_access_token(&token).unwrap();

        assert_eq!(claims.user_id, user.user_id.to_string());
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
        assert_eq!(claims.jti, None);
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let issuer = JwtTokenIssuer::new(&AuthConfig::development());
        let user = user();
        let now = Utc::now();

        let access = issuer.issue_access_token(&user, now).unwrap();
        let refresh = issuer.issue_refresh_token(&user, now).unwrap();

        assert!(matches!(issuer.verify_refresh_token(&access), Err(AuthError::TokenInvalid)));
        assert!(matches!(issuer.verify_access_token(&refresh), Err(AuthError::TokenInvalid)));
        assert!(issuer.verify_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn test_refresh_tokens_unique_within_same_second() {
        let issuer = JwtTokenIssuer::new(&AuthConfig::development());
        let user = user();
        let now = Utc::now();

        let a = issuer.issue_refresh_token(&user, now).unwrap();
        let b = issuer.issue_refresh_token(&user, now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = JwtTokenIssuer::new(&AuthConfig::development());
        let issued = Utc::now() - chrono::Duration::days(8);

        let token = issuer.issue_access_token(&user(), issued).unwrap();
        assert!(matches!(issuer.verify_access_token(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_expiry_follows_injected_clock() {
        let clock = MockClock::starting_now();
        let issuer = JwtTokenIssuer::with_clock(&AuthConfig::development(), Arc::new(clock.clone()));
        let now = now_utc(&clock);

        let access = issuer.issue_access_token(&user(), now).unwrap();
        let refresh = issuer.issue_refresh_token(&user(), now).unwrap();

        clock.advance(Duration::from_secs(7 * 24 * 3600 - 1));
        assert!(issuer.verify_access_token(&access).is_ok());

        clock.advance(Duration::from_secs(1));
        assert!(matches!(issuer.verify_access_token(&access), Err(AuthError::TokenInvalid)));
        assert!(issuer.verify_refresh_token(&refresh).is_ok());

        clock.advance(Duration::from_secs(23 * 24 * 3600));
        assert!(matches!(issuer.verify_refresh_token(&refresh), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = JwtTokenIssuer::new(&AuthConfig::development());
        let token = issuer.issue_access_token(&user(), Utc::now()).unwrap();
        let tampered = format!("{token}x");
        assert!(issuer.verify_access_token(&tampered).is_err());
    }
}
