//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::env;
use std::fmt;
use std::time::Duration;

use platform::crypto::{DEFAULT_TOKEN_BYTES, generate_token};
use platform::password::HashParams;
use thiserror::Error;

use crate::domain::entity::user::LockoutPolicy;

const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

#[derive(Debug, Error)]
pub enum AuthConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 key for access tokens
    pub jwt_secret: String,
    /// HS256 key for refresh tokens
    pub refresh_token_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub lockout: LockoutPolicy,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Key for at-rest encryption of activity log fields
    pub field_encryption_key: Option<String>,
    /// Argon2id cost for new hashes
    pub hash_params: HashParams,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("refresh_token_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("lockout", &self.lockout)
            .field("cookie_secure", &self.cookie_secure)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field(
                "field_encryption_key",
                &self.field_encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, refresh_token_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            refresh_token_secret: refresh_token_secret.into(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            lockout: LockoutPolicy::default(),
            cookie_secure: true,
            password_pepper: None,
            field_encryption_key: None,
            hash_params: HashParams::default(),
        }
    }

    /// Random signing secrets and insecure cookies, for local runs and tests
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::new(
                generate_token(DEFAULT_TOKEN_BYTES),
                generate_token(DEFAULT_TOKEN_BYTES),
            )
        }
    }

    /// Load from environment variables
    ///
    /// `JWT_SECRET` and `REFRESH_TOKEN_SECRET` are required; everything else
    /// falls back to the defaults.
    pub fn from_env() -> Result<Self, AuthConfigError> {
        let jwt_secret = required("JWT_SECRET")?;
        let refresh_token_secret = required("REFRESH_TOKEN_SECRET")?;

        let mut config = Self::new(jwt_secret, refresh_token_secret);
        config.access_token_ttl = secs_or("JWT_EXPIRES_IN_SECS", config.access_token_ttl)?;
        config.refresh_token_ttl =
            secs_or("REFRESH_TOKEN_EXPIRES_IN_SECS", config.refresh_token_ttl)?;
        config.lockout.max_failures =
            positive_or("LOGIN_LOCKOUT_MAX_FAILURES", config.lockout.max_failures)?;
        config.lockout.duration = secs_or("LOGIN_LOCKOUT_SECS", config.lockout.duration)?;
        config.cookie_secure = parse_or("COOKIE_SECURE", config.cookie_secure)?;
        config.password_pepper = optional("PASSWORD_PEPPER").map(String::into_bytes);
        config.field_encryption_key = optional("FIELD_ENCRYPTION_KEY");
        Ok(config)
    }

    pub fn with_hash_params(mut self, params: HashParams) -> Self {
        self.hash_params = params;
        self
    }

    pub fn with_field_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.field_encryption_key = Some(key.into());
        self
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn refresh_token_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.refresh_token_ttl).unwrap_or(chrono::Duration::days(30))
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, AuthConfigError> {
    optional(var).ok_or(AuthConfigError::Missing(var))
}

fn parse_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, AuthConfigError> {
    match optional(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AuthConfigError::Invalid { var, value }),
    }
}

fn positive_or(var: &'static str, default: u32) -> Result<u32, AuthConfigError> {
    match parse_or(var, default)? {
        0 => Err(AuthConfigError::Invalid {
            var,
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}

/// Whole seconds; zero is rejected
fn secs_or(var: &'static str, default: Duration) -> Result<Duration, AuthConfigError> {
    match parse_or(var, default.as_secs())? {
        0 => Err(AuthConfigError::Invalid {
            var,
            value: "0".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 9] = [
        "JWT_SECRET",
        "REFRESH_TOKEN_SECRET",
        "JWT_EXPIRES_IN_SECS",
        "REFRESH_TOKEN_EXPIRES_IN_SECS",
        "LOGIN_LOCKOUT_MAX_FAILURES",
        "LOGIN_LOCKOUT_SECS",
        "COOKIE_SECURE",
        "PASSWORD_PEPPER",
        "FIELD_ENCRYPTION_KEY",
    ];

    /// Every variable, unset unless overridden
    fn env(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
        VARS.iter()
            .map(|var| {
                let value = overrides.iter().find(|(k, _)| k == var).map(|(_, v)| *v);
                (*var, value)
            })
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new("a", "b");
        assert_eq!(config.access_token_ttl, Duration::from_secs(604_800));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(2_592_000));
        assert_eq!(config.lockout.max_failures, 5);
        assert!(config.cookie_secure);
        assert!(config.pepper().is_none());
    }

    #[test]
    fn test_development_uses_random_secrets() {
        let a = AuthConfig::development();
        let b = AuthConfig::development();
        assert_ne!(a.jwt_secret, b.jwt_secret);
        assert_ne!(a.jwt_secret, a.refresh_token_secret);
        assert!(!a.cookie_secure);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AuthConfig::new("super-secret-jwt", "super-secret-refresh")
            .with_field_encryption_key("field-key");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("field-key"));
    }

    #[test]
    fn test_from_env_requires_secrets() {
        temp_env::with_vars(env(&[]), || {
            assert!(matches!(
                AuthConfig::from_env(),
                Err(AuthConfigError::Missing("JWT_SECRET"))
            ));
        });
    }

    #[test]
    fn test_from_env_reads_overrides() {
        let vars = env(&[
            ("JWT_SECRET", "jwt"),
            ("REFRESH_TOKEN_SECRET", "refresh"),
            ("JWT_EXPIRES_IN_SECS", "3600"),
            ("COOKIE_SECURE", "false"),
            ("PASSWORD_PEPPER", "pepper"),
        ]);
        temp_env::with_vars(vars, || {
            let config = AuthConfig::from_env().unwrap();
            assert_eq!(config.jwt_secret, "jwt");
            assert_eq!(config.access_token_ttl, Duration::from_secs(3600));
            assert!(!config.cookie_secure);
            assert_eq!(config.pepper(), Some(b"pepper".as_slice()));
        });
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        let vars = env(&[
            ("JWT_SECRET", "jwt"),
            ("REFRESH_TOKEN_SECRET", "refresh"),
            ("JWT_EXPIRES_IN_SECS", "soon"),
        ]);
        temp_env::with_vars(vars, || {
            assert!(matches!(
                AuthConfig::from_env(),
                Err(AuthConfigError::Invalid { var: "JWT_EXPIRES_IN_SECS", .. })
            ));
        });
    }

    #[test]
    fn test_from_env_rejects_zero() {
        for var in [
            "JWT_EXPIRES_IN_SECS",
            "REFRESH_TOKEN_EXPIRES_IN_SECS",
            "LOGIN_LOCKOUT_MAX_FAILURES",
            "LOGIN_LOCKOUT_SECS",
        ] {
            let vars = env(&[
                ("JWT_SECRET", "jwt"),
                ("REFRESH_TOKEN_SECRET", "refresh"),
                (var, "0"),
            ]);
            temp_env::with_vars(vars, || match AuthConfig::from_env() {
                Err(AuthConfigError::Invalid { var: rejected, .. }) => assert_eq!(rejected, var),
                other => panic!("{var}=0 accepted: {other:?}"),
            });
        }
    }
}
