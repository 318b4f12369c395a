//! Authentication backend
//!
//! Turns provider-issued tokens into an `AuthContext`. Users live at the
//! identity provider; nothing is looked up locally.

use tower_sessions::Session;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::{AuthContext, AuthMethod};
use crate::error::AuthError;
use crate::jwt::validate_jwt_token;
use crate::types::{AuthIdentity, AuthRole};

/// Session key holding the raw access token after a session login
pub const SESSION_TOKEN_KEY: &str = "auth_token";

/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthBackend {
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a token and build the caller's context
    pub fn authenticate_token(
        &self,
        token: &str,
        method: AuthMethod,
    ) -> Result<AuthContext, AuthError> {
        let claims = validate_jwt_token(token, &self.config)?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;
        let email = claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or(AuthError::MissingEmail)?;

        let user = AuthIdentity {
            id,
            email,
            name: claims.name,
            role: AuthRole::from_claim(claims.role.as_deref()),
        };

        Ok(AuthContext::new(user, method))
    }

    /// Validate `token` and remember it in the session
    pub async fn login(&self, session: &Session, token: &str) -> Result<AuthContext, AuthError> {
        let context = self.authenticate_token(token, AuthMethod::Session)?;

        // New identity, new session id.
        session.cycle_id().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to cycle session id");
            AuthError::SessionUnavailable
        })?;
        session
            .insert(SESSION_TOKEN_KEY, token.to_string())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to store session token");
                AuthError::SessionUnavailable
            })?;

        tracing::info!(user_id = %context.user.id, "Session login");
        Ok(context)
    }

    pub async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        session
            .remove::<String>(SESSION_TOKEN_KEY)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to clear session token");
                AuthError::SessionUnavailable
            })?;
        Ok(())
    }

    /// Context for a session login, if one is present and still valid.
    ///
    /// Expired or otherwise invalid tokens are dropped from the session.
    pub async fn from_session(&self, session: &Session) -> Result<Option<AuthContext>, AuthError> {
        let token: Option<String> = session.get(SESSION_TOKEN_KEY).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read session token");
            AuthError::SessionUnavailable
        })?;

        let Some(token) = token else {
            return Ok(None);
        };

        match self.authenticate_token(&token, AuthMethod::Session) {
            Ok(context) => Ok(Some(context)),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping stale session token");
                self.logout(session).await?;
                Ok(None)
            }
        }
    }
}
