//! Security Configuration
//!
//! Limits and lifetimes for the in-memory security stores, read from the
//! environment with defaults for anything unset.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::clock::Clock;
use crate::csrf::{self, CsrfProtection};
use crate::rate_limit::{self, RateLimitConfig, RateLimiter};

/// Invalid environment value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {var}: {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Security store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Login attempts per caller identity
    pub login_rate_limit: RateLimitConfig,
    /// General API requests per caller identity
    pub api_rate_limit: RateLimitConfig,
    pub csrf_token_ttl: Duration,
    /// Interval of the background sweep
    pub sweep_interval: Duration,
    /// Cap on identities tracked by each rate limiter
    pub max_tracked_identities: usize,
    /// Cap on sessions holding a CSRF token
    pub max_csrf_sessions: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            login_rate_limit: RateLimitConfig::login(),
            api_rate_limit: RateLimitConfig::api(),
            csrf_token_ttl: csrf::DEFAULT_TOKEN_TTL,
            sweep_interval: Duration::from_secs(60),
            max_tracked_identities: rate_limit::DEFAULT_MAX_TRACKED_IDENTITIES,
            max_csrf_sessions: csrf::DEFAULT_MAX_SESSIONS,
        }
    }
}

impl SecurityConfig {
    /// Read overrides from the environment
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `LOGIN_RATE_LIMIT_MAX` | 5 |
    /// | `LOGIN_RATE_LIMIT_WINDOW_SECS` | 900 |
    /// | `API_RATE_LIMIT_MAX` | 100 |
    /// | `API_RATE_LIMIT_WINDOW_SECS` | 900 |
    /// | `CSRF_TOKEN_TTL_SECS` | 3600 |
    /// | `SECURITY_SWEEP_INTERVAL_SECS` | 60 |
    /// | `MAX_TRACKED_IDENTITIES` | 100000 |
    /// | `MAX_CSRF_SESSIONS` | 100000 |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            login_rate_limit: RateLimitConfig {
                max_requests: positive_or("LOGIN_RATE_LIMIT_MAX", defaults.login_rate_limit.max_requests)?,
                window: secs_or("LOGIN_RATE_LIMIT_WINDOW_SECS", defaults.login_rate_limit.window)?,
            },
            api_rate_limit: RateLimitConfig {
                max_requests: positive_or("API_RATE_LIMIT_MAX", defaults.api_rate_limit.max_requests)?,
                window: secs_or("API_RATE_LIMIT_WINDOW_SECS", defaults.api_rate_limit.window)?,
            },
            csrf_token_ttl: secs_or("CSRF_TOKEN_TTL_SECS", defaults.csrf_token_ttl)?,
            sweep_interval: secs_or("SECURITY_SWEEP_INTERVAL_SECS", defaults.sweep_interval)?,
            max_tracked_identities: positive_or(
                "MAX_TRACKED_IDENTITIES",
                defaults.max_tracked_identities,
            )?,
            max_csrf_sessions: positive_or("MAX_CSRF_SESSIONS", defaults.max_csrf_sessions)?,
        })
    }

    pub fn login_limiter(&self, clock: Arc<dyn Clock>) -> RateLimiter {
        RateLimiter::with_clock(self.login_rate_limit.clone(), clock)
            .with_max_tracked(self.max_tracked_identities)
    }

    pub fn api_limiter(&self, clock: Arc<dyn Clock>) -> RateLimiter {
        RateLimiter::with_clock(self.api_rate_limit.clone(), clock)
            .with_max_tracked(self.max_tracked_identities)
    }

    pub fn csrf_protection(&self, clock: Arc<dyn Clock>) -> CsrfProtection {
        CsrfProtection::with_clock(clock)
            .with_ttl(self.csrf_token_ttl)
            .with_max_sessions(self.max_csrf_sessions)
    }
}

fn var_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { var, value }),
        Err(_) => Ok(default),
    }
}

/// Like `var_or`, but zero is rejected
fn positive_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq + ToString,
{
    let value = var_or(var, default)?;
    if value == T::default() {
        return Err(ConfigError {
            var,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Whole seconds; zero is rejected
fn secs_or(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    positive_or(var, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    const VARS: [&str; 8] = [
        "LOGIN_RATE_LIMIT_MAX",
        "LOGIN_RATE_LIMIT_WINDOW_SECS",
        "API_RATE_LIMIT_MAX",
        "API_RATE_LIMIT_WINDOW_SECS",
        "CSRF_TOKEN_TTL_SECS",
        "SECURITY_SWEEP_INTERVAL_SECS",
        "MAX_TRACKED_IDENTITIES",
        "MAX_CSRF_SESSIONS",
    ];

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars_unset(VARS, || {
            assert_eq!(SecurityConfig::from_env().unwrap(), SecurityConfig::default());
        });
    }

    #[test]
    fn test_overrides_from_env() {
        temp_env::with_vars(
            [
                ("LOGIN_RATE_LIMIT_MAX", Some("3")),
                ("LOGIN_RATE_LIMIT_WINDOW_SECS", Some("60")),
                ("CSRF_TOKEN_TTL_SECS", Some(" 120 ")),
                ("MAX_CSRF_SESSIONS", Some("10")),
            ],
            || {
                let config = SecurityConfig::from_env().unwrap();
                assert_eq!(config.login_rate_limit, RateLimitConfig::new(3, 60_000));
                assert_eq!(config.api_rate_limit, RateLimitConfig::api());
                assert_eq!(config.csrf_token_ttl, Duration::from_secs(120));
                assert_eq!(config.max_csrf_sessions, 10);
            },
        );
    }

    #[test]
    fn test_invalid_value_is_reported() {
        temp_env::with_var("API_RATE_LIMIT_MAX", Some("lots"), || {
            let err = SecurityConfig::from_env().unwrap_err();
            assert_eq!(err.var, "API_RATE_LIMIT_MAX");
            assert_eq!(err.value, "lots");
        });
    }

    #[test]
    fn test_zero_values_are_rejected() {
        for var in VARS {
            temp_env::with_var(var, Some("0"), || {
                let err = SecurityConfig::from_env().unwrap_err();
                assert_eq!(err.var, var);
                assert_eq!(err.value, "0");
            });
        }
    }

    #[test]
    fn test_zero_window_never_reaches_limiter() {
        temp_env::with_vars(
            [
                ("LOGIN_RATE_LIMIT_WINDOW_SECS", Some("0")),
                ("SECURITY_SWEEP_INTERVAL_SECS", Some("0")),
            ],
            || {
                let err = SecurityConfig::from_env().unwrap_err();
                assert_eq!(err.var, "LOGIN_RATE_LIMIT_WINDOW_SECS");
            },
        );
    }

    #[test]
    fn test_builds_stores() {
        let config = SecurityConfig {
            login_rate_limit: RateLimitConfig::new(1, 1_000),
            ..SecurityConfig::default()
        };
        let clock: Arc<dyn Clock> = Arc::new(MockClock::new(0));

        let login = config.login_limiter(clock.clone());
        assert!(login.is_allowed("a"));
        assert!(!login.is_allowed("a"));
        assert_eq!(config.api_limiter(clock.clone()).config().max_requests, 100);
        assert_eq!(config.csrf_protection(clock).ttl(), csrf::DEFAULT_TOKEN_TTL);
    }
}
