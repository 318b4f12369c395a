//! Public project pages
//!
//! Implements:
//! - GET /projects/                  — Projects that have started
//! - GET /projects/category/{slug}/  — Same, within one category
//! - GET /projects/project/{slug}/   — Project detail, through the content pipeline

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use crowdfund_common::{Error, Result};
use uuid::Uuid;

use crate::api::content::ContentRequest;
use crate::api::middleware::CampaignsState;
use crate::api::views::{
    progress_text, render, CategoryLink, ProjectCard, ProjectDetailTemplate, ProjectListTemplate,
    RewardRow,
};
use crate::domain::entities::{today, Category};

async fn project_list(
    state: &CampaignsState,
    heading: String,
    active: Option<&Category>,
) -> Result<Html<String>> {
    let today = today();
    let projects = state
        .repos
        .projects
        .list_started(today, active.map(|c| c.id))
        .await?;

    let mut cards = Vec::with_capacity(projects.len());
    for project in &projects {
        let totals = state.repos.pledges.totals(project.id).await?;
        cards.push(ProjectCard::new(
            project,
            &totals,
            &state.site.currency_code,
            today,
        ));
    }

    let active_id: Option<Uuid> = active.map(|c| c.id);
    let categories = state
        .repos
        .categories
        .list()
        .await?
        .iter()
        .map(|c| CategoryLink::new(c, Some(c.id) == active_id))
        .collect();

    render(&ProjectListTemplate {
        heading,
        projects: cards,
        categories,
    })
}

/// GET /projects/
pub async fn list_projects(State(state): State<CampaignsState>) -> Result<Html<String>> {
    project_list(&state, "Projects".to_string(), None).await
}

/// GET /projects/category/{slug}/
pub async fn list_category(
    State(state): State<CampaignsState>,
    Path(slug): Path<String>,
) -> Result<Html<String>> {
    let category = state
        .repos
        .categories
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| Error::NotFound("Category not found".to_string()))?;

    project_list(&state, category.title.clone(), Some(&category)).await
}

/// GET /projects/project/{slug}/
pub async fn project_detail(
    State(state): State<CampaignsState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let project = state
        .repos
        .projects
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| Error::NotFound("Project not found".to_string()))?;

    let request = ContentRequest {
        project: &project,
        today: today(),
    };
    if let Some(response) = state.content.prepare(&request).await {
        return Ok(response);
    }

    let totals = state.repos.pledges.totals(project.id).await?;
    let rewards = state.repos.rewards.availability(project.id).await?;
    let category = match project.category_id {
        Some(id) => state.repos.categories.get_by_id(id).await?,
        None => None,
    };

    let currency = &state.site.currency_code;
    let page = render(&ProjectDetailTemplate {
        title: project.title.clone(),
        description: project.description.clone(),
        category_title: category.as_ref().map(|c| c.title.clone()).unwrap_or_default(),
        category_url: category.as_ref().map(|c| c.url()).unwrap_or_default(),
        goal: state.money(project.goal),
        progress: progress_text(&project, &totals, currency),
        backers: totals.backers,
        days_left: project.days_left(request.today),
        expired: project.is_expired(request.today),
        back_url: project.back_url(),
        rewards: rewards
            .iter()
            .map(|row| RewardRow::new(row, currency, None))
            .collect(),
    })?;

    Ok(state.content.finalize(&request, page.into_response()))
}
