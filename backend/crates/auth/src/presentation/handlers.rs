//! HTTP Handlers

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use std::sync::Arc;

use platform::clock::Clock;
use platform::cookie::{CSRF_SESSION_COOKIE, CookieConfig, extract_cookie};
use platform::csrf::{CsrfProtection, generate_session_id};
use platform::rate_limit::RateLimiter;

use crate::application::config::AuthConfig;
use crate::application::{
    Claims, RefreshInput, RefreshUseCase, RequestContext, SignInInput, SignInUseCase,
    SignOutInput, SignOutUseCase, SignUpInput, SignUpUseCase, TokenIssuer,
};
use crate::domain::repository::{ActivityLogRepository, RefreshTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ApiResponse, CsrfResponse, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse,
    RefreshRequest, RefreshResponse, SignUpRequest, SignUpResponse, UserResponse,
};
use crate::presentation::middleware::ClientIp;

/// Everything the auth routes need from storage
pub trait AuthRepositories:
    UserRepository + RefreshTokenRepository + ActivityLogRepository + Send + Sync + 'static
{
}

impl<T> AuthRepositories for T where
    T: UserRepository + RefreshTokenRepository + ActivityLogRepository + Send + Sync + 'static
{
}

/// Shared state for auth handlers
pub struct AuthAppState<R> {
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<dyn TokenIssuer>,
    /// Login attempts per caller identity
    pub login_limiter: Arc<RateLimiter>,
    /// All auth routes per caller identity
    pub api_limiter: Arc<RateLimiter>,
    pub csrf: Arc<CsrfProtection>,
    pub clock: Arc<dyn Clock>,
}

// Manual impl: derive would demand `R: Clone`.
impl<R> Clone for AuthAppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
            login_limiter: self.login_limiter.clone(),
            api_limiter: self.api_limiter.clone(),
            csrf: self.csrf.clone(),
            clock: self.clock.clone(),
        }
    }
}

fn request_context(identity: String, headers: &HeaderMap) -> RequestContext {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    RequestContext::new(identity, user_agent)
}

fn csrf_cookie(state: &AuthAppState<impl AuthRepositories>) -> CookieConfig {
    CookieConfig::csrf_session(state.config.cookie_secure, state.csrf.ttl().as_secs())
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    ClientIp(identity): ClientIp,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<ApiResponse<LoginResponse>>>
where
    R: AuthRepositories,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.login_limiter.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
    };
    let output = use_case
        .execute(input, &request_context(identity, &headers))
        .await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        user: UserResponse::from(&output.user),
        access_token: output.tokens.access_token,
        refresh_token: output.tokens.refresh_token,
    })))
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    ClientIp(identity): ClientIp,
    headers: HeaderMap,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<ApiResponse<SignUpResponse>>)>
where
    R: AuthRepositories,
{
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let input = SignUpInput {
        email: req.email,
        password: req.password,
        name: req.name,
    };
    let output = use_case
        .execute(input, &request_context(identity, &headers))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SignUpResponse {
            user: UserResponse::from(&output.user),
        })),
    ))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<ApiResponse<RefreshResponse>>>
where
    R: AuthRepositories,
{
    let use_case = RefreshUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.clock.clone(),
    );

    let access_token = use_case
        .execute(RefreshInput {
            refresh_token: req.refresh_token,
        })
        .await?;

    Ok(Json(ApiResponse::ok(RefreshResponse { access_token })))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
///
/// Revokes the refresh token, drops the CSRF entry and clears its cookie.
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    ClientIp(identity): ClientIp,
    headers: HeaderMap,
    Json(req): Json<LogoutRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    let use_case = SignOutUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let revoked = use_case
        .execute(
            SignOutInput {
                refresh_token: req.refresh_token,
            },
            &request_context(identity, &headers),
        )
        .await?;

    if let Some(session_id) = extract_cookie(&headers, CSRF_SESSION_COOKIE) {
        state.csrf.invalidate(&session_id);
    }

    let cookie = csrf_cookie(&state)
        .delete_cookie_header()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok(LogoutResponse { revoked })),
    ))
}

// ============================================================================
// CSRF
// ============================================================================

/// GET /api/auth/csrf
///
/// Issues a fresh token for the caller's CSRF session, starting a new
/// session when the cookie is absent.
pub async fn csrf_token<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    let session_id =
        extract_cookie(&headers, CSRF_SESSION_COOKIE).unwrap_or_else(generate_session_id);
    let csrf_token = state.csrf.generate_token(&session_id);

    let cookie = csrf_cookie(&state)
        .set_cookie_header(&session_id)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok(CsrfResponse { csrf_token })),
    ))
}

// ============================================================================
// Current User
// ============================================================================

/// GET /api/auth/me
pub async fn me(Extension(claims): Extension<Claims>) -> Json<ApiResponse<Claims>> {
    Json(ApiResponse::ok(claims))
}
