//! Platform Crate - Security Utility Core
//!
//! This crate provides the abuse-prevention and secret-handling foundations
//! the authentication flow depends on:
//! - Trailing-window rate limiting keyed by caller identity
//! - CSRF token issuance and verification with expiry
//! - AES-256-GCM field encryption, SHA-256 hashing, secure random tokens
//! - Password strength rules and Argon2id password hashing
//! - Client IP extraction and allow/deny list checks
//! - Cookie helpers, security headers and input sanitisation
//!
//! ## State ownership
//! Rate-limit windows and CSRF entries are held by explicit instances
//! (`RateLimiter`, `CsrfProtection`) that the server owns and shares via
//! `Arc`. State is process-local: replicas do not share it.

pub mod client;
pub mod clock;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod csrf;
pub mod headers;
pub mod password;
pub mod rate_limit;
pub mod sanitize;
pub mod sweep;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::SecurityConfig;
pub use csrf::CsrfProtection;
pub use rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter};
pub use sweep::{Sweep, spawn_periodic_sweep};
