//! Campaigns domain: projects, categories, rewards, backers, pledges
//!
//! Public HTML views, the session-threaded backing workflow, and the staff
//! admin API all live here.

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::state::{PledgeEvent, PledgeGuardContext, PledgeStateMachine};
pub use domain::validation::{
    slugify, validate_pledge_form, validate_slug, PledgeForm, PledgeFormErrors, ValidPledge,
};

// Re-export repository types
pub use repository::{
    BackerRepository, CampaignRepositories, CategoryRepository, PledgeRepository, PledgeTotals,
    ProjectRepository, Reservation, RewardRepository,
};

// Re-export API types
pub use api::content::{
    ContentPipeline, ContentRequest, FinalizeContent, Finalized, PrepareContent, Prepared,
    ProjectCacheControl, ScheduledProjectGate,
};
pub use api::routes;
pub use api::session::PledgeSession;
pub use api::CampaignsState;
