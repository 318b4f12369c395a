//! HTTP handlers for the campaigns domain

pub mod accounts;
pub mod admin;
pub mod pledges;
pub mod projects;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Project list, also the fallback when the workflow has nothing to show
pub const PROJECTS_PATH: &str = "/projects/";

/// Second step of the backing workflow
pub const AUTHENTICATE_PATH: &str = "/projects/backer/authenticate/";

/// 302 to `location`
pub(crate) fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}
