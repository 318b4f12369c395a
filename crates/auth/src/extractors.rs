//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.
//! A bearer token wins over a session login when both are present.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tower_sessions::Session;

use crate::backend::AuthBackend;
use crate::context::{AuthContext, AuthMethod};
use crate::error::AuthError;
use crate::jwt::extract_bearer_token;

/// Resolve the caller, if any. A malformed or invalid bearer token is an
/// error rather than an anonymous request.
async fn resolve(parts: &Parts, backend: &AuthBackend) -> Result<Option<AuthContext>, AuthError> {
    if let Some(auth_header) = parts.headers.get(AUTHORIZATION) {
        let token = extract_bearer_token(auth_header)?;
        return backend
            .authenticate_token(&token, AuthMethod::Bearer)
            .map(Some);
    }

    match parts.extensions.get::<Session>() {
        Some(session) => backend.from_session(session).await,
        None => Ok(None),
    }
}

/// Authenticated user extractor; rejects anonymous requests with 401
#[derive(Debug)]
pub struct AuthUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);
        resolve(parts, &backend)
            .await?
            .map(AuthUser)
            .ok_or(AuthError::MissingAuthorization)
    }
}

/// Optional authentication, for pages that redirect anonymous visitors
/// to the login page instead of failing.
#[derive(Debug)]
pub struct MaybeAuthUser(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);
        Ok(MaybeAuthUser(resolve(parts, &backend).await?))
    }
}

/// Staff-only extractor for the admin interface (403 for other users)
#[derive(Debug)]
pub struct StaffUser(pub AuthContext);

impl<S> FromRequestParts<S> for StaffUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let AuthUser(auth_context) = AuthUser::from_request_parts(parts, state).await?;

        if !auth_context.is_staff() {
            return Err(AuthError::InsufficientRole);
        }

        Ok(StaffUser(auth_context))
    }
}
