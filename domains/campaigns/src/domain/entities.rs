//! Domain entities for the campaigns domain
//!
//! Projects collect pledges toward a goal between a start and an end date.
//! Rewards are optional tiers unlocked by a minimum amount, and a pledge
//! moves from anonymous submission to a completed payment through the
//! backing workflow.

use chrono::{DateTime, NaiveDate, Utc};
use crowdfund_common::{Currency, Error, Result, StateError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::state::{PledgeEvent, PledgeGuardContext, PledgeStateMachine};
use crate::domain::validation::{slugify, validate_slug};

/// Maximum project title length
pub const MAX_TITLE_LENGTH: usize = 100;

/// Today's date as used for start/end comparisons
#[mutants::skip] // Reads the wall clock
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a category; the slug is derived from the title when omitted
    pub fn new(title: String, slug: Option<String>) -> Result<Self> {
        let title = title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::Validation(
                "Category title must be 1-100 characters".to_string(),
            ));
        }

        let slug = slug.unwrap_or_else(|| slugify(&title));
        if !validate_slug(&slug) {
            return Err(Error::Validation(format!("Invalid slug: '{}'", slug)));
        }

        Ok(Category {
            id: Uuid::new_v4(),
            title,
            slug,
            created_at: Utc::now(),
        })
    }

    pub fn url(&self) -> String {
        format!("/projects/category/{}/", self.slug)
    }
}

/// Project entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub goal: Currency,
    #[sqlx(rename = "start_date")]
    pub start: NaiveDate,
    #[sqlx(rename = "end_date")]
    pub end: NaiveDate,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub slug: Option<String>,
    pub goal: Currency,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub description: String,
    pub category_id: Option<Uuid>,
}

impl Project {
    /// Create a new project with validation
    pub fn new(fields: NewProject) -> Result<Self> {
        let title = fields.title.trim().to_string();
        let slug = fields.slug.unwrap_or_else(|| slugify(&title));
        let now = Utc::now();

        let project = Project {
            id: Uuid::new_v4(),
            title,
            slug,
            goal: fields.goal,
            start: fields.start,
            end: fields.end,
            description: fields.description,
            category_id: fields.category_id,
            created_at: now,
            updated_at: now,
        };
        project.validate()?;
        Ok(project)
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() || self.title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::Validation(
                "Project title must be 1-100 characters".to_string(),
            ));
        }

        if !validate_slug(&self.slug) {
            return Err(Error::Validation(format!("Invalid slug: '{}'", self.slug)));
        }

        if !self.goal.is_positive() {
            return Err(Error::Validation(
                "Project goal must be greater than zero".to_string(),
            ));
        }

        if self.end < self.start {
            return Err(Error::Validation(
                "Project end date must not be before its start date".to_string(),
            ));
        }

        Ok(())
    }

    /// A project is expired on its end date and after.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end <= today
    }

    pub fn has_started(&self, today: NaiveDate) -> bool {
        self.start <= today
    }

    /// Whole days until the end date, never negative
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        (self.end - today).num_days().max(0)
    }

    pub fn url(&self) -> String {
        format!("/projects/project/{}/", self.slug)
    }

    pub fn back_url(&self) -> String {
        format!("/projects/back/{}/", self.slug)
    }

    pub fn backed_url(&self) -> String {
        format!("/projects/project/{}/backed/", self.slug)
    }
}

/// Reward tier entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reward {
    pub id: Uuid,
    pub project_id: Uuid,
    pub minimum: Currency,
    pub description: String,
    /// `None` or `Some(0)` means unlimited
    pub quantity: Option<i32>,
    #[sqlx(rename = "position")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

impl Reward {
    pub fn new(
        project_id: Uuid,
        minimum: Currency,
        description: String,
        quantity: Option<i32>,
        order: i32,
    ) -> Result<Self> {
        let reward = Reward {
            id: Uuid::new_v4(),
            project_id,
            minimum,
            description,
            quantity,
            order,
            created_at: Utc::now(),
        };
        reward.validate()?;
        Ok(reward)
    }

    pub fn validate(&self) -> Result<()> {
        if self.minimum.is_negative() {
            return Err(Error::Validation(
                "Reward minimum cannot be negative".to_string(),
            ));
        }

        if self.quantity.is_some_and(|q| q < 0) {
            return Err(Error::Validation(
                "Reward quantity cannot be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Zero is the unlimited sentinel, same as no quantity at all.
    pub fn limit(&self) -> Option<i64> {
        self.quantity.filter(|q| *q > 0).map(i64::from)
    }

    /// Whether another pledge can claim this reward given `pledged` existing ones
    pub fn is_available(&self, pledged: i64) -> bool {
        match self.limit() {
            Some(limit) => pledged < limit,
            None => true,
        }
    }

    pub fn remaining(&self, pledged: i64) -> Option<i64> {
        self.limit().map(|limit| (limit - pledged).max(0))
    }
}

/// A reward together with the number of pledges already claiming it
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RewardAvailability {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub reward: Reward,
    pub pledged: i64,
}

impl RewardAvailability {
    pub fn is_available(&self) -> bool {
        self.reward.is_available(self.pledged)
    }

    pub fn remaining(&self) -> Option<i64> {
        self.reward.remaining(self.pledged)
    }
}

/// Backer entity: the donor record for one identity-provider user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Backer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Backer {
    pub fn new(user_id: Uuid, email: String, name: Option<String>) -> Self {
        Backer {
            id: Uuid::new_v4(),
            user_id,
            email,
            name,
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Payment providers a pledge can be paid through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Paypal,
    Postfinance,
}

impl PaymentProvider {
    pub const ALL: [PaymentProvider; 2] = [PaymentProvider::Paypal, PaymentProvider::Postfinance];

    /// Form value, as submitted by the back form
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Paypal => "paypal",
            PaymentProvider::Postfinance => "postfinance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentProvider::Paypal => "PayPal",
            PaymentProvider::Postfinance => "PostFinance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == value.trim())
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub use crate::domain::state::PledgeStatus;

/// Pledge entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pledge {
    pub id: Uuid,
    pub project_id: Uuid,
    pub reward_id: Option<Uuid>,
    pub backer_id: Option<Uuid>,
    pub amount: Currency,
    pub provider: PaymentProvider,
    pub status: PledgeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pledge {
    /// Create an anonymous pending pledge
    pub fn new(
        project_id: Uuid,
        reward_id: Option<Uuid>,
        amount: Currency,
        provider: PaymentProvider,
    ) -> Result<Self> {
        if !amount.is_positive() {
            return Err(Error::Validation(
                "Pledge amount must be greater than zero".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Pledge {
            id: Uuid::new_v4(),
            project_id,
            reward_id,
            backer_id: None,
            amount,
            provider,
            status: PledgeStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    fn guard_context(&self) -> PledgeGuardContext {
        PledgeGuardContext {
            has_backer: self.backer_id.is_some(),
        }
    }

    /// Bind the pledge to the backer who authenticated for it
    ///
    /// Assigning the current backer again is a no-op; another backer is refused.
    pub fn assign_backer(&mut self, backer_id: Uuid) -> std::result::Result<(), StateError> {
        if self.backer_id == Some(backer_id) {
            return Ok(());
        }
        self.status = PledgeStateMachine::transition(
            self.status,
            PledgeEvent::AssignBacker,
            Some(&self.guard_context()),
        )?;
        self.backer_id = Some(backer_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the pledge paid. Confirming a completed pledge is a no-op.
    pub fn confirm(&mut self) -> std::result::Result<bool, StateError> {
        if self.status == PledgeStatus::Completed {
            return Ok(false);
        }

        self.status = PledgeStateMachine::transition(
            self.status,
            PledgeEvent::Confirm,
            Some(&self.guard_context()),
        )?;
        self.updated_at = Utc::now();
        Ok(true)
    }

    pub fn is_completed(&self) -> bool {
        self.status == PledgeStatus::Completed
    }
}
