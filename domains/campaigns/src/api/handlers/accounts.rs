//! Session login handlers
//!
//! Implements:
//! - POST /accounts/session/  — Store a provider-issued token in the session
//! - POST /accounts/logout/   — Forget it again

use axum::{extract::State, response::Response, Form};
use crowdfund_auth::AuthError;
use serde::Deserialize;
use tower_sessions::Session;

use super::{found, PROJECTS_PATH};
use crate::api::middleware::CampaignsState;

#[derive(Debug, Deserialize)]
pub struct SessionLoginForm {
    pub access_token: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Only same-site paths are followed after login
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => PROJECTS_PATH,
    }
}

/// POST /accounts/session/
pub async fn session_login(
    State(state): State<CampaignsState>,
    session: Session,
    Form(form): Form<SessionLoginForm>,
) -> Result<Response, AuthError> {
    state.auth.login(&session, form.access_token.trim()).await?;
    Ok(found(safe_next(form.next.as_deref())))
}

/// POST /accounts/logout/
pub async fn logout(
    State(state): State<CampaignsState>,
    session: Session,
) -> Result<Response, AuthError> {
    state.auth.logout(&session).await?;
    Ok(found(PROJECTS_PATH))
}
