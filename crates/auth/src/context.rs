//! Authorization context for authenticated users

use crate::types::{AuthIdentity, AuthRole};

/// How the caller proved their identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Bearer,
    Session,
}

/// Represents an authenticated user context
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthIdentity,
    pub method: AuthMethod,
}

impl AuthContext {
    pub fn new(user: AuthIdentity, method: AuthMethod) -> Self {
        Self { user, method }
    }

    pub fn is_staff(&self) -> bool {
        self.user.role == AuthRole::Staff
    }

    /// Name to greet the user with, falling back to the email address
    pub fn display_name(&self) -> &str {
        self.user.name.as_deref().unwrap_or(&self.user.email)
    }
}
