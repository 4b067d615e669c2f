//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{activity_log::ActivityLog, refresh_token::RefreshToken, user::User};
pub use repository::{ActivityLogRepository, RefreshTokenRepository, UserRepository};
