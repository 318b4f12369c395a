//! Backing workflow handlers
//!
//! Implements:
//! - GET  /projects/back/{slug}/            — Back form
//! - POST /projects/back/{slug}/            — Submit a pledge anonymously
//! - GET  /projects/backer/authenticate/    — Bind the pledge to the user's backer
//! - GET  /projects/pledge/thankyou/        — Provider return: confirm and email
//! - GET  /projects/project/{slug}/backed/  — Confirmation page
//!
//! The pledge travels between requests through `PledgeSession`.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use crowdfund_auth::MaybeAuthUser;
use crowdfund_common::{Error, Result};
use crowdfund_email::PledgeConfirmation;

use super::{found, AUTHENTICATE_PATH, PROJECTS_PATH};
use crate::api::middleware::CampaignsState;
use crate::api::session::PledgeSession;
use crate::api::views::{render, BackFormTemplate, BackedTemplate};
use crate::domain::entities::{today, Backer, Pledge, Project, RewardAvailability};
use crate::domain::validation::{validate_pledge_form, PledgeForm, PledgeFormErrors};
use crate::repository::Reservation;

/// Load a project that can be shown publicly; not-yet-started projects do
/// not exist as far as visitors are concerned.
async fn visible_project(state: &CampaignsState, slug: &str) -> Result<Project> {
    state
        .repos
        .projects
        .get_by_slug(slug)
        .await?
        .filter(|project| project.has_started(today()))
        .ok_or_else(|| Error::NotFound("Project not found".to_string()))
}

fn back_form(
    state: &CampaignsState,
    project: &Project,
    rewards: &[RewardAvailability],
    form: &PledgeForm,
    errors: PledgeFormErrors,
) -> Result<Response> {
    let template = BackFormTemplate::new(
        project,
        rewards,
        &state.site.currency_code,
        form,
        errors,
    );
    Ok(render(&template)?.into_response())
}

/// GET /projects/back/{slug}/
pub async fn show_back_form(
    State(state): State<CampaignsState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let project = visible_project(&state, &slug).await?;
    if project.is_expired(today()) {
        return Ok(found(project.url()));
    }

    let rewards = state.repos.rewards.availability(project.id).await?;
    back_form(
        &state,
        &project,
        &rewards,
        &PledgeForm::default(),
        PledgeFormErrors::default(),
    )
}

/// POST /projects/back/{slug}/
///
/// **Business Rules:**
/// - Expired projects accept no pledges
/// - Amount must cover the chosen reward's minimum
/// - Limited rewards cannot be claimed beyond their quantity, checked again
///   atomically with the insert
pub async fn submit_pledge(
    State(state): State<CampaignsState>,
    session: PledgeSession,
    Path(slug): Path<String>,
    Form(form): Form<PledgeForm>,
) -> Result<Response> {
    let project = visible_project(&state, &slug).await?;
    if project.is_expired(today()) {
        tracing::info!(project_id = %project.id, "Rejected pledge for expired project");
        return Ok(found(project.url()));
    }

    let rewards = state.repos.rewards.availability(project.id).await?;
    let valid = match validate_pledge_form(&form, &rewards) {
        Ok(valid) => valid,
        Err(errors) => return back_form(&state, &project, &rewards, &form, errors),
    };

    let pledge = Pledge::new(project.id, valid.reward_id, valid.amount, valid.provider)?;
    match state.repos.pledges.reserve(&pledge).await? {
        Reservation::Created(pledge) => {
            session.begin(pledge.id).await?;
            tracing::info!(
                pledge_id = %pledge.id,
                project_id = %project.id,
                amount = %pledge.amount,
                "Pledge submitted"
            );
            Ok(found(AUTHENTICATE_PATH))
        }
        Reservation::RewardUnavailable => {
            // Another pledge took the last unit between validation and insert.
            let rewards = state.repos.rewards.availability(project.id).await?;
            back_form(
                &state,
                &project,
                &rewards,
                &form,
                PledgeFormErrors::reward_unavailable(),
            )
        }
    }
}

/// GET /projects/backer/authenticate/
pub async fn authenticate_backer(
    State(state): State<CampaignsState>,
    session: PledgeSession,
    MaybeAuthUser(auth): MaybeAuthUser,
) -> Result<Response> {
    let Some(pledge_id) = session.pending().await? else {
        return Ok(found(PROJECTS_PATH));
    };

    let Some(auth) = auth else {
        return Ok(found(format!(
            "{}?next={}",
            state.site.login_url, AUTHENTICATE_PATH
        )));
    };

    let mut pledge = state
        .repos
        .pledges
        .get_by_id(pledge_id)
        .await?
        .ok_or_else(|| Error::NotFound("Pledge not found".to_string()))?;

    let candidate = Backer::new(
        auth.user.id,
        auth.user.email.clone(),
        auth.user.name.clone(),
    );
    let backer = state.repos.backers.get_or_create(&candidate).await?;

    if pledge.backer_id != Some(backer.id) {
        pledge.assign_backer(backer.id).map_err(|e| {
            tracing::warn!(pledge_id = %pledge.id, backer_id = %backer.id, "Pledge is bound to another backer");
            Error::from(e)
        })?;
        state.repos.pledges.update(&pledge).await?;
        tracing::info!(pledge_id = %pledge.id, backer_id = %backer.id, "Pledge assigned to backer");
    }

    Ok(found(state.provider_url(pledge.provider)))
}

/// GET /projects/pledge/thankyou/
///
/// The payment provider sends the visitor here once paid. Sends exactly one
/// confirmation email per pledge.
pub async fn thank_you(
    State(state): State<CampaignsState>,
    session: PledgeSession,
) -> Result<Response> {
    let Some(pledge_id) = session.pending().await? else {
        return Ok(found(PROJECTS_PATH));
    };

    let mut pledge = state
        .repos
        .pledges
        .get_by_id(pledge_id)
        .await?
        .ok_or_else(|| Error::NotFound("Pledge not found".to_string()))?;

    let Some(backer_id) = pledge.backer_id else {
        return Ok(found(AUTHENTICATE_PATH));
    };

    let project = state
        .repos
        .projects
        .get_by_id(pledge.project_id)
        .await?
        .ok_or_else(|| Error::NotFound("Project not found".to_string()))?;
    let backer = state
        .repos
        .backers
        .get_by_id(backer_id)
        .await?
        .ok_or_else(|| Error::NotFound("Backer not found".to_string()))?;
    let reward = match pledge.reward_id {
        Some(id) => state.repos.rewards.get_by_id(id).await?,
        None => None,
    };

    if pledge.confirm()? {
        state.repos.pledges.update(&pledge).await?;
        tracing::info!(pledge_id = %pledge.id, "Pledge completed");
    }

    let amount = state.money(pledge.amount);
    let confirmation = PledgeConfirmation {
        backer_name: backer.display_name(),
        project_title: &project.title,
        project_slug: &project.slug,
        amount: &amount,
        reward: reward.as_ref().map(|r| r.description.as_str()),
    };
    state
        .email
        .send_pledge_confirmation(&backer.email, &confirmation, pledge.id)
        .await
        .map_err(|e| Error::Internal(format!("Failed to send pledge confirmation: {}", e)))?;

    session.complete(pledge.id).await?;

    Ok(found(project.backed_url()))
}

/// GET /projects/project/{slug}/backed/
pub async fn backed(
    State(state): State<CampaignsState>,
    session: PledgeSession,
    Path(slug): Path<String>,
) -> Result<Response> {
    let project = state
        .repos
        .projects
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| Error::NotFound("Project not found".to_string()))?;

    let Some(pledge_id) = session.completed().await? else {
        return Ok(found(project.url()));
    };

    let pledge = match state.repos.pledges.get_by_id(pledge_id).await? {
        Some(pledge) if pledge.project_id == project.id => pledge,
        _ => return Ok(found(project.url())),
    };

    let backer_name = match pledge.backer_id {
        Some(id) => state
            .repos
            .backers
            .get_by_id(id)
            .await?
            .map(|b| b.display_name().to_string())
            .unwrap_or_default(),
        None => String::new(),
    };
    let reward = match pledge.reward_id {
        Some(id) => state
            .repos
            .rewards
            .get_by_id(id)
            .await?
            .map(|r| r.description)
            .unwrap_or_default(),
        None => String::new(),
    };

    let page = render(&BackedTemplate {
        title: project.title.clone(),
        project_url: project.url(),
        backer_name,
        amount: state.money(pledge.amount),
        reward,
    })?;

    session.clear_completed().await?;

    Ok(page.into_response())
}
