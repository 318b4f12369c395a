//! Staff-only editing API
//!
//! JSON CRUD over projects, rewards and categories, plus the pledge list of
//! a project. Every handler takes `StaffUser`, so anonymous callers get 401
//! and authenticated non-staff callers get 403.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use crowdfund_auth::StaffUser;
use crowdfund_common::{Currency, Error, Pagination, Result, ValidatedJson};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::CampaignsState;
use crate::domain::entities::{
    Category, NewProject, Pledge, Project, Reward, RewardAvailability,
};
use crate::domain::validation::validate_slug;

fn validate_slug_format(slug: &str) -> std::result::Result<(), validator::ValidationError> {
    if validate_slug(slug) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_format"))
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectSearch {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    /// Derived from the title when omitted
    #[validate(custom(function = "validate_slug_format", message = "Invalid slug format"))]
    pub slug: Option<String>,

    pub goal: Currency,
    pub start: NaiveDate,
    pub end: NaiveDate,

    #[serde(default)]
    pub description: String,

    pub category_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_slug_format", message = "Invalid slug format"))]
    pub slug: Option<String>,

    pub goal: Option<Currency>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub description: Option<String>,

    /// `null` removes the category
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRewardRequest {
    pub minimum: Currency,

    #[validate(length(min = 1, max = 1000))]
    pub description: String,

    /// Omitted or 0 means unlimited
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,

    /// Appended after the existing rewards when omitted
    pub order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRewardRequest {
    pub minimum: Option<Currency>,

    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub quantity: Option<Option<i32>>,

    pub order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(custom(function = "validate_slug_format", message = "Invalid slug format"))]
    pub slug: Option<String>,
}

/// Project with its public URL and funding totals
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub url: String,
    pub pledged: Currency,
    pub backers: i64,
}

async fn project_response(state: &CampaignsState, project: Project) -> Result<ProjectResponse> {
    let totals = state.repos.pledges.totals(project.id).await?;
    Ok(ProjectResponse {
        url: project.url(),
        pledged: totals.pledged,
        backers: totals.backers,
        project,
    })
}

async fn load_project(state: &CampaignsState, id: Uuid) -> Result<Project> {
    state
        .repos
        .projects
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Project {} not found", id)))
}

async fn ensure_category(state: &CampaignsState, category_id: Option<Uuid>) -> Result<()> {
    if let Some(id) = category_id {
        if state.repos.categories.get_by_id(id).await?.is_none() {
            return Err(Error::Validation(format!("Category {} does not exist", id)));
        }
    }
    Ok(())
}

async fn ensure_slug_free(state: &CampaignsState, slug: &str, own_id: Option<Uuid>) -> Result<()> {
    match state.repos.projects.get_by_slug(slug).await? {
        Some(existing) if Some(existing.id) != own_id => Err(Error::Conflict(format!(
            "Project slug '{}' already exists",
            slug
        ))),
        _ => Ok(()),
    }
}

/// **GET /admin/projects**
///
/// Latest end date first; `q` matches title or slug.
pub async fn list_projects(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Query(pagination): Query<Pagination>,
    Query(search): Query<ProjectSearch>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let query = search.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let projects = state
        .repos
        .projects
        .search(query, pagination.offset(), pagination.limit())
        .await?;

    let mut responses = Vec::with_capacity(projects.len());
    for project in projects {
        responses.push(project_response(&state, project).await?);
    }
    Ok(Json(responses))
}

/// **POST /admin/projects**
///
/// **Business Rules:**
/// - Slug defaults to the slugified title and must be unique
/// - End date may not precede the start date
/// - Goal must be positive
pub async fn create_project(
    StaffUser(staff): StaffUser,
    State(state): State<CampaignsState>,
    ValidatedJson(request): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    ensure_category(&state, request.category_id).await?;

    let project = Project::new(NewProject {
        title: request.title,
        slug: request.slug,
        goal: request.goal,
        start: request.start,
        end: request.end,
        description: request.description,
        category_id: request.category_id,
    })?;
    ensure_slug_free(&state, &project.slug, None).await?;

    let created = state.repos.projects.create(&project).await?;
    tracing::info!(project_id = %created.id, slug = %created.slug, staff_id = %staff.user.id, "Project created");

    Ok((StatusCode::CREATED, Json(project_response(&state, created).await?)))
}

/// **GET /admin/projects/{id}**
pub async fn get_project(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>> {
    let project = load_project(&state, id).await?;
    Ok(Json(project_response(&state, project).await?))
}

/// **PATCH /admin/projects/{id}**
pub async fn update_project(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    let mut project = load_project(&state, id).await?;

    if let Some(title) = request.title {
        project.title = title.trim().to_string();
    }
    if let Some(slug) = request.slug {
        ensure_slug_free(&state, &slug, Some(project.id)).await?;
        project.slug = slug;
    }
    if let Some(goal) = request.goal {
        project.goal = goal;
    }
    if let Some(start) = request.start {
        project.start = start;
    }
    if let Some(end) = request.end {
        project.end = end;
    }
    if let Some(description) = request.description {
        project.description = description;
    }
    if let Some(category_id) = request.category_id {
        ensure_category(&state, category_id).await?;
        project.category_id = category_id;
    }

    project.validate()?;
    project.updated_at = Utc::now();

    let updated = state.repos.projects.update(&project).await?;
    tracing::info!(project_id = %updated.id, "Project updated");

    Ok(Json(project_response(&state, updated).await?))
}

/// **DELETE /admin/projects/{id}**
///
/// Removes the project together with its rewards and pledges.
pub async fn delete_project(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.repos.projects.delete(id).await? {
        return Err(Error::NotFound(format!("Project {} not found", id)));
    }
    tracing::info!(project_id = %id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// **GET /admin/projects/{id}/rewards**
///
/// Rewards in display order, with how many pledges claim each.
pub async fn list_rewards(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RewardAvailability>>> {
    let project = load_project(&state, id).await?;
    Ok(Json(state.repos.rewards.availability(project.id).await?))
}

/// Position after the last reward, pinned at `i32::MAX`
fn next_order(existing: &[Reward]) -> i32 {
    existing
        .iter()
        .map(|r| r.order.saturating_add(1))
        .max()
        .unwrap_or(0)
}

/// **POST /admin/projects/{id}/rewards**
pub async fn create_reward(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateRewardRequest>,
) -> Result<(StatusCode, Json<Reward>)> {
    let project = load_project(&state, id).await?;

    let order = match request.order {
        Some(order) => order,
        None => {
            let existing = state.repos.rewards.list_for_project(project.id).await?;
            next_order(&existing)
        }
    };

    let reward = Reward::new(
        project.id,
        request.minimum,
        request.description,
        request.quantity,
        order,
    )?;
    let created = state.repos.rewards.create(&reward).await?;
    tracing::info!(reward_id = %created.id, project_id = %project.id, "Reward created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// **PATCH /admin/rewards/{id}**
pub async fn update_reward(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateRewardRequest>,
) -> Result<Json<Reward>> {
    let mut reward = state
        .repos
        .rewards
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Reward {} not found", id)))?;

    if let Some(minimum) = request.minimum {
        reward.minimum = minimum;
    }
    if let Some(description) = request.description {
        reward.description = description;
    }
    if let Some(quantity) = request.quantity {
        reward.quantity = quantity;
    }
    if let Some(order) = request.order {
        reward.order = order;
    }
    reward.validate()?;

    Ok(Json(state.repos.rewards.update(&reward).await?))
}

/// **DELETE /admin/rewards/{id}**
///
/// Pledges that claimed the reward keep their amount and lose the reward.
pub async fn delete_reward(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.repos.rewards.delete(id).await? {
        return Err(Error::NotFound(format!("Reward {} not found", id)));
    }
    tracing::info!(reward_id = %id, "Reward deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// **GET /admin/projects/{id}/pledges**
///
/// Every pledge of the project, pending ones included, newest first.
pub async fn list_pledges(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Pledge>>> {
    let project = load_project(&state, id).await?;
    Ok(Json(state.repos.pledges.list_for_project(project.id).await?))
}

/// **GET /admin/categories**
pub async fn list_categories(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.repos.categories.list().await?))
}

/// **POST /admin/categories**
pub async fn create_category(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = Category::new(request.title, request.slug)?;

    if state
        .repos
        .categories
        .get_by_slug(&category.slug)
        .await?
        .is_some()
    {
        return Err(Error::Conflict(format!(
            "Category slug '{}' already exists",
            category.slug
        )));
    }

    let created = state.repos.categories.create(&category).await?;
    tracing::info!(category_id = %created.id, slug = %created.slug, "Category created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// **DELETE /admin/categories/{id}**
///
/// Projects in the category become uncategorized.
pub async fn delete_category(
    _staff: StaffUser,
    State(state): State<CampaignsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.repos.categories.delete(id).await? {
        return Err(Error::NotFound(format!("Category {} not found", id)));
    }
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
