//! Application Layer
//!
//! Use cases and application services.

pub mod activity;
pub mod config;
pub mod refresh;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod token;

use chrono::{DateTime, Utc};
use platform::clock::Clock;

// Re-exports
pub use activity::RequestContext;
pub use config::{AuthConfig, AuthConfigError};
pub use refresh::{RefreshInput, RefreshUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::{SignOutInput, SignOutUseCase};
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use token::{Claims, TokenIssuer, TokenPair};

/// Current time of `clock` as a UTC timestamp
pub(crate) fn now_utc(clock: &dyn Clock) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(clock.now_ms() as i64).unwrap_or_else(Utc::now)
}
