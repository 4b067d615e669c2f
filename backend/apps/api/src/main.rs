//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::domain::repository::RefreshTokenRepository;
use auth::{AuthAppState, AuthConfig, JwtTokenIssuer, PgAuthRepository, auth_router};
use axum::{
    Json, Router, http,
    http::{Method, header},
    routing::get,
};
use platform::clock::{Clock, SystemClock};
use platform::{SecurityConfig, Sweep, spawn_periodic_sweep};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set in environment"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../database/migrations").run(&pool).await?;

    tracing::info!("Migrations completed");

    let repo = PgAuthRepository::new(pool.clone());

    // Startup cleanup: errors here should not prevent server startup
    if let Err(e) = repo.delete_expired(chrono::Utc::now()).await {
        tracing::warn!(error = %e, "Refresh token cleanup failed, continuing anyway");
    }

    // Auth configuration
    let auth_config = if cfg!(debug_assertions) && env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET not set, using random development secrets");
        AuthConfig::development()
    } else {
        AuthConfig::from_env()?
    };
    tracing::info!(config = ?auth_config, "Auth configuration loaded");

    // In-process security state
    let security = SecurityConfig::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let login_limiter = Arc::new(security.login_limiter(clock.clone()));
    let api_limiter = Arc::new(security.api_limiter(clock.clone()));
    let csrf = Arc::new(security.csrf_protection(clock.clone()));

    let sweep_targets: Vec<Arc<dyn Sweep>> =
        vec![login_limiter.clone(), api_limiter.clone(), csrf.clone()];
    let _sweeper = spawn_periodic_sweep(sweep_targets, security.sweep_interval);

    let auth_state = AuthAppState {
        repo: Arc::new(repo),
        tokens: Arc::new(JwtTokenIssuer::with_clock(&auth_config, clock.clone())),
        config: Arc::new(auth_config),
        login_limiter,
        api_limiter,
        csrf,
        clock,
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            http::HeaderName::from_static(auth::middleware::CSRF_HEADER),
        ]))
        .allow_credentials(true);

    // Build router
    let mut app = Router::new()
        .route("/api/healthcheck", get(healthcheck))
        .nest("/api/auth", auth_router(auth_state));

    for (name, value) in platform::headers::security_headers() {
        app = app.layer(SetResponseHeaderLayer::overriding(name, value));
    }

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let addr: SocketAddr = bind_addr.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
