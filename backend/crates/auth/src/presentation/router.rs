//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::presentation::handlers::{self, AuthAppState, AuthRepositories};
use crate::presentation::middleware::{api_rate_limit, require_bearer, require_csrf};

/// Auth routes, to be nested under `/api/auth`
///
/// Every route passes the API rate limiter; `/signup` and `/logout` also
/// require a CSRF token, `/me` a bearer token.
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthRepositories,
{
    let csrf_protected = Router::new()
        .route("/signup", post(handlers::sign_up::<R>))
        .route("/logout", post(handlers::sign_out::<R>))
        .route_layer(from_fn_with_state(state.clone(), require_csrf::<R>));

    let authenticated = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(from_fn_with_state(state.clone(), require_bearer::<R>));

    Router::new()
        .route("/login", post(handlers::sign_in::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/csrf", get(handlers::csrf_token::<R>))
        .merge(csrf_protected)
        .merge(authenticated)
        .layer(from_fn_with_state(state.clone(), api_rate_limit::<R>))
        .with_state(state)
}
