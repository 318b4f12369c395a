//! Askama templates for the public pages
//!
//! Templates only see preformatted strings and flags; all formatting
//! happens in the constructors here.

use askama::Template;
use axum::response::Html;
use chrono::NaiveDate;
use crowdfund_common::{Error, Result};

use crate::domain::entities::{
    Category, PaymentProvider, Project, RewardAvailability,
};
use crate::domain::validation::{PledgeForm, PledgeFormErrors};
use crate::repository::PledgeTotals;

pub fn render<T: Template>(template: &T) -> Result<Html<String>> {
    template
        .render()
        .map(Html)
        .map_err(|e| Error::Internal(format!("Failed to render template: {}", e)))
}

/// `"{pledged} {currency} ({percent}%)"`
pub fn progress_text(project: &Project, totals: &PledgeTotals, currency: &str) -> String {
    format!(
        "{} {} ({}%)",
        totals.pledged,
        currency,
        totals.pledged.percent_of(project.goal)
    )
}

pub struct CategoryLink {
    pub title: String,
    pub url: String,
    pub active: bool,
}

impl CategoryLink {
    pub fn new(category: &Category, active: bool) -> Self {
        Self {
            title: category.title.clone(),
            url: category.url(),
            active,
        }
    }
}

pub struct ProjectCard {
    pub title: String,
    pub url: String,
    pub progress: String,
    pub days_left: i64,
    pub expired: bool,
}

impl ProjectCard {
    pub fn new(project: &Project, totals: &PledgeTotals, currency: &str, today: NaiveDate) -> Self {
        Self {
            title: project.title.clone(),
            url: project.url(),
            progress: progress_text(project, totals, currency),
            days_left: project.days_left(today),
            expired: project.is_expired(today),
        }
    }
}

#[derive(Template)]
#[template(path = "projects/list.html")]
pub struct ProjectListTemplate {
    pub heading: String,
    pub projects: Vec<ProjectCard>,
    pub categories: Vec<CategoryLink>,
}

pub struct RewardRow {
    pub id: String,
    pub minimum: String,
    pub description: String,
    /// Empty for unlimited rewards
    pub remaining: String,
    pub available: bool,
    pub selected: bool,
}

impl RewardRow {
    pub fn new(row: &RewardAvailability, currency: &str, selected: Option<&str>) -> Self {
        let id = row.reward.id.to_string();
        Self {
            selected: selected == Some(id.as_str()),
            id,
            minimum: format!("{} {}", row.reward.minimum, currency),
            description: row.reward.description.clone(),
            remaining: row
                .remaining()
                .map(|left| left.to_string())
                .unwrap_or_default(),
            available: row.is_available(),
        }
    }
}

#[derive(Template)]
#[template(path = "projects/detail.html")]
pub struct ProjectDetailTemplate {
    pub title: String,
    pub description: String,
    /// Empty when the project is uncategorized
    pub category_title: String,
    pub category_url: String,
    pub goal: String,
    pub progress: String,
    pub backers: i64,
    pub days_left: i64,
    pub expired: bool,
    pub back_url: String,
    pub rewards: Vec<RewardRow>,
}

pub struct ProviderOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "projects/back.html")]
pub struct BackFormTemplate {
    pub title: String,
    pub project_url: String,
    pub action: String,
    pub currency: String,
    pub amount: String,
    pub no_reward: bool,
    pub rewards: Vec<RewardRow>,
    pub providers: Vec<ProviderOption>,
    pub amount_error: String,
    pub reward_error: String,
    pub provider_error: String,
}

impl BackFormTemplate {
    /// Form for `project`, refilled with what the visitor submitted
    pub fn new(
        project: &Project,
        rewards: &[RewardAvailability],
        currency: &str,
        form: &PledgeForm,
        errors: PledgeFormErrors,
    ) -> Self {
        let selected_reward = form.reward.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let selected_provider = form.provider.as_deref().and_then(PaymentProvider::parse);

        Self {
            title: project.title.clone(),
            project_url: project.url(),
            action: project.back_url(),
            currency: currency.to_string(),
            amount: form.amount.clone().unwrap_or_default(),
            no_reward: selected_reward.is_none(),
            rewards: rewards
                .iter()
                .map(|row| RewardRow::new(row, currency, selected_reward))
                .collect(),
            providers: PaymentProvider::ALL
                .iter()
                .map(|provider| ProviderOption {
                    value: provider.as_str(),
                    label: provider.label(),
                    selected: selected_provider == Some(*provider),
                })
                .collect(),
            amount_error: errors.amount.unwrap_or_default(),
            reward_error: errors.reward.unwrap_or_default(),
            provider_error: errors.provider.unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "projects/backed.html")]
pub struct BackedTemplate {
    pub title: String,
    pub project_url: String,
    pub backer_name: String,
    pub amount: String,
    /// Empty when the pledge claimed no reward
    pub reward: String,
}
