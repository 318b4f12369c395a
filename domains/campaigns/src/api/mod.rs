//! API layer for the campaigns domain
//!
//! Public HTML views, the backing workflow, session login, and the staff
//! admin API.

pub mod content;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod views;

pub use middleware::CampaignsState;
pub use routes::routes;
