//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database, in-memory and JWT implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Email + password login for dashboard staff (admin, manager, staff)
//! - HS256 access tokens and revocable refresh tokens
//! - Signup gated by password strength and a common-password denylist
//! - CSRF tokens bound to a `csrf_session` cookie
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, verified on the blocking pool
//! - Login rate limit per caller identity (5 per 15 minutes)
//! - Account lockout after 5 consecutive failed logins (15 minutes)
//! - Refresh tokens stored only as SHA-256 fingerprints
//! - Optional AES-256-GCM encryption of audit fields

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::{AuthConfig, AuthConfigError};
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryAuthRepository, JwtTokenIssuer, PgAuthRepository};
pub use presentation::{AuthAppState, auth_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
