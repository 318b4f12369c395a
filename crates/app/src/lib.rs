//! Crowdfund application composition root
//!
//! Builds the campaigns state from configuration and wraps the domain
//! router with the session layer and shared infrastructure routes.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use crowdfund_auth::{AuthBackend, AuthConfig};
use crowdfund_campaigns::{CampaignRepositories, CampaignsState, ContentPipeline};
use crowdfund_common::config::Config;
use crowdfund_email::{EmailConfig, EmailServiceFactory};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Sessions idle for longer than this are dropped, abandoning any pledge in flight
pub const SESSION_INACTIVITY_DAYS: i64 = 2;

/// How often expired session rows are purged
const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(15 * 60);

/// Create the application router backed by PostgreSQL
pub async fn create_app(config: Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    let auth_config = AuthConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let email_config = EmailConfig::from_env()?;
    let email_service = EmailServiceFactory::create(email_config).await?;

    let sessions = postgres_session_store(pool.clone()).await?;

    let state = CampaignsState {
        repos: CampaignRepositories::postgres(pool),
        auth: AuthBackend::new(auth_config),
        email: Arc::from(email_service),
        site: config.site,
        content: ContentPipeline::standard(),
    };

    Ok(create_app_with(state, sessions))
}

/// Session store shared by every instance through the database.
///
/// Creates the store's table if needed and starts the expired-row sweeper.
pub async fn postgres_session_store(pool: PgPool) -> Result<PostgresStore, anyhow::Error> {
    let store = PostgresStore::new(pool);
    store.migrate().await?;

    let sweeper = store.clone();
    tokio::spawn(async move {
        if let Err(e) = sweeper
            .continuously_delete_expired(EXPIRED_SESSION_SWEEP)
            .await
        {
            tracing::error!(error = %e, "Expired session deletion stopped");
        }
    });

    Ok(store)
}

/// Router around an already-assembled state and session store
pub fn create_app_with<S>(state: CampaignsState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let sessions = session_layer(store, state.site.secure_cookies());

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(crowdfund_campaigns::routes().with_state(state))
        .layer(sessions)
}

pub fn session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    // Provider returns arrive as cross-site top-level navigations.
    SessionManagerLayer::new(store)
        .with_same_site(SameSite::Lax)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            SESSION_INACTIVITY_DAYS,
        )))
}

/// CORS for the admin API from a comma-separated origin list
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
