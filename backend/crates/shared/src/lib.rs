//! Shared Kernel
//!
//! Vocabulary shared by every backend crate of the admin dashboard:
//! - The unified [`error::app_error::AppError`] and its HTTP classification
//! - Typed identifiers for persisted entities
//!
//! Nothing security-specific lives here; see the `platform` crate for that.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
