//! Typed access to the session keys threaded through the backing workflow
//!
//! `pledge_id` is set when the back form is submitted and moves to
//! `completed_pledge_id` on the thank-you step. The confirmation page
//! clears `completed_pledge_id` once rendered.

use axum::{extract::FromRequestParts, http::request::Parts};
use crowdfund_common::{Error, Result};
use tower_sessions::Session;
use uuid::Uuid;

pub const PLEDGE_ID_KEY: &str = "pledge_id";
pub const COMPLETED_PLEDGE_ID_KEY: &str = "completed_pledge_id";

fn session_error(err: tower_sessions::session::Error) -> Error {
    Error::Internal(format!("Session error: {}", err))
}

#[derive(Debug, Clone)]
pub struct PledgeSession {
    session: Session,
}

impl PledgeSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The pledge currently moving through the workflow
    pub async fn pending(&self) -> Result<Option<Uuid>> {
        self.session
            .get::<Uuid>(PLEDGE_ID_KEY)
            .await
            .map_err(session_error)
    }

    /// Start tracking a freshly submitted pledge
    pub async fn begin(&self, pledge_id: Uuid) -> Result<()> {
        self.session
            .insert(PLEDGE_ID_KEY, pledge_id)
            .await
            .map_err(session_error)
    }

    /// Move the pledge from `pledge_id` to `completed_pledge_id`
    pub async fn complete(&self, pledge_id: Uuid) -> Result<()> {
        self.session
            .remove::<Uuid>(PLEDGE_ID_KEY)
            .await
            .map_err(session_error)?;
        self.session
            .insert(COMPLETED_PLEDGE_ID_KEY, pledge_id)
            .await
            .map_err(session_error)
    }

    pub async fn completed(&self) -> Result<Option<Uuid>> {
        self.session
            .get::<Uuid>(COMPLETED_PLEDGE_ID_KEY)
            .await
            .map_err(session_error)
    }

    pub async fn clear_completed(&self) -> Result<()> {
        self.session
            .remove::<Uuid>(COMPLETED_PLEDGE_ID_KEY)
            .await
            .map_err(session_error)?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for PledgeSession
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(PledgeSession::new)
            .ok_or_else(|| Error::Internal("Session layer is not installed".to_string()))
    }
}
