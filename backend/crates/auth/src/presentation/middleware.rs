//! Auth Middleware
//!
//! Caller identity extraction, API rate limiting, CSRF enforcement for
//! state-changing requests, and bearer-token authentication.

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::{HeaderMap, Method, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use std::convert::Infallible;
use std::net::SocketAddr;

use platform::client::extract_ip_or_peer;
use platform::cookie::{CSRF_SESSION_COOKIE, extract_cookie};

use crate::error::AuthError;
use crate::presentation::handlers::{AuthAppState, AuthRepositories};

/// Header carrying the CSRF token on state-changing requests
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Caller identity used as the rate-limit and audit key
///
/// Forwarding headers win over the socket peer address; see
/// [`platform::client::extract_ip`] for the precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(ClientIp(extract_ip_or_peer(&parts.headers, peer)))
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    header?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

/// General API limiter keyed by caller identity
pub async fn api_rate_limit<R>(
    State(state): State<AuthAppState<R>>,
    ClientIp(identity): ClientIp,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthRepositories,
{
    let result = state.api_limiter.check(&identity);
    if !result.allowed {
        tracing::warn!(%identity, "API rate limit exceeded");
        return Err(AuthError::RateLimitExceeded {
            retry_after_secs: result.retry_after.as_secs_f64().ceil() as u64,
        });
    }

    Ok(next.run(req).await)
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Reject state-changing requests without a valid CSRF token
///
/// The session id comes from the `csrf_session` cookie, the token from the
/// `x-csrf-token` header.
pub async fn require_csrf<R>(
    State(state): State<AuthAppState<R>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthRepositories,
{
    if is_safe_method(req.method()) {
        return Ok(next.run(req).await);
    }

    if !csrf_valid(&state, req.headers()) {
        return Err(AuthError::CsrfTokenInvalid);
    }

    Ok(next.run(req).await)
}

fn csrf_valid<R: AuthRepositories>(state: &AuthAppState<R>, headers: &HeaderMap) -> bool {
    let Some(session_id) = extract_cookie(headers, CSRF_SESSION_COOKIE) else {
        tracing::debug!("CSRF session cookie missing");
        return false;
    };
    let Some(token) = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()) else {
        tracing::debug!("CSRF header missing");
        return false;
    };
    state.csrf.verify_token(&session_id, token)
}

/// Require a valid access token; the verified claims are stored in the
/// request extensions for handlers
pub async fn require_bearer<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthRepositories,
{
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = extract_bearer_token(header).ok_or(AuthError::TokenInvalid)?;

    let claims = state.tokens.verify_access_token(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
