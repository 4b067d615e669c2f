//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::{AuthAppState, AuthRepositories};
pub use middleware::{ClientIp, api_rate_limit, extract_bearer_token, require_bearer, require_csrf};
pub use router::auth_router;
