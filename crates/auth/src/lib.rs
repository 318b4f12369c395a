//! Authentication for the Crowdfund site
//!
//! Identities come from an external identity provider as HS256 JWTs, sent
//! either as a bearer token or stored in the server-side session after
//! a session login. Extractors work with any state implementing
//! `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
mod types;

pub use backend::{AuthBackend, SESSION_TOKEN_KEY};
pub use claims::IdentityClaims;
pub use config::AuthConfig;
pub use context::{AuthContext, AuthMethod};
pub use error::AuthError;
pub use extractors::{AuthUser, MaybeAuthUser, StaffUser};
pub use types::{AuthIdentity, AuthRole};
