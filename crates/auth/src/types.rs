//! Identity types handed to handlers

use serde::Serialize;
use uuid::Uuid;

/// The authenticated person, as described by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: AuthRole,
}

/// Role for auth decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthRole {
    Member,
    Staff,
}

impl AuthRole {
    /// Map the provider's `role` claim; anything unknown is a plain member.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("staff") | Some("service_role") => AuthRole::Staff,
            _ => AuthRole::Member,
        }
    }

    pub fn can_admin(&self) -> bool {
        matches!(self, AuthRole::Staff)
    }
}

impl std::fmt::Display for AuthRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthRole::Member => write!(f, "member"),
            AuthRole::Staff => write!(f, "staff"),
        }
    }
}
