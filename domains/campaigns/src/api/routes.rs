//! Route definitions for the campaigns domain

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{accounts, admin, pledges, projects};
use super::middleware::CampaignsState;

/// Public project pages
fn project_routes() -> Router<CampaignsState> {
    Router::new()
        .route("/projects/", get(projects::list_projects))
        .route("/projects/category/{slug}/", get(projects::list_category))
        .route("/projects/project/{slug}/", get(projects::project_detail))
}

/// Backing workflow, in the order a visitor walks through it
fn pledge_routes() -> Router<CampaignsState> {
    Router::new()
        .route(
            "/projects/back/{slug}/",
            get(pledges::show_back_form).post(pledges::submit_pledge),
        )
        .route(
            "/projects/backer/authenticate/",
            get(pledges::authenticate_backer),
        )
        .route("/projects/pledge/thankyou/", get(pledges::thank_you))
        .route("/projects/project/{slug}/backed/", get(pledges::backed))
}

/// Session login and logout
fn account_routes() -> Router<CampaignsState> {
    Router::new()
        .route("/accounts/session/", post(accounts::session_login))
        .route("/accounts/logout/", post(accounts::logout))
}

/// Staff editing API
fn admin_routes() -> Router<CampaignsState> {
    Router::new()
        .route(
            "/admin/projects",
            get(admin::list_projects).post(admin::create_project),
        )
        .route(
            "/admin/projects/{id}",
            get(admin::get_project)
                .patch(admin::update_project)
                .delete(admin::delete_project),
        )
        .route(
            "/admin/projects/{id}/rewards",
            get(admin::list_rewards).post(admin::create_reward),
        )
        .route(
            "/admin/projects/{id}/pledges",
            get(admin::list_pledges),
        )
        .route(
            "/admin/rewards/{id}",
            patch(admin::update_reward).delete(admin::delete_reward),
        )
        .route(
            "/admin/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/admin/categories/{id}",
            axum::routing::delete(admin::delete_category),
        )
}

/// Create all campaigns domain routes
pub fn routes() -> Router<CampaignsState> {
    Router::new()
        .merge(project_routes())
        .merge(pledge_routes())
        .merge(account_routes())
        .merge(admin_routes())
}
