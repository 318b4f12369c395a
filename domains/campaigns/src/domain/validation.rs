//! Validation helpers: slugs and the back form

use crowdfund_common::Currency;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{PaymentProvider, RewardAvailability};

/// Maximum slug length
pub const MAX_SLUG_LENGTH: usize = 50;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_AMOUNT: &str = "Enter a valid amount.";
pub const MSG_INVALID_REWARD: &str = "Select a valid reward.";
pub const MSG_AMOUNT_TOO_LOW: &str = "Amount is too low for this reward.";
pub const MSG_REWARD_UNAVAILABLE: &str = "Sorry, this reward is not available anymore.";
pub const MSG_NO_PROVIDER: &str = "Please select a payment provider.";

lazy_static::lazy_static! {
    /// Lowercase alphanumeric characters with single hyphens between them
    pub static ref SLUG_REGEX: Regex =
        Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
}

pub fn validate_slug(slug: &str) -> bool {
    slug.len() <= MAX_SLUG_LENGTH && SLUG_REGEX.is_match(slug)
}

/// Derive a slug from a title: ASCII alphanumerics survive, every other run
/// of characters becomes one hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    slug.trim_end_matches('-').to_string()
}

/// Raw back form submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PledgeForm {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub reward: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Inline errors shown next to the back form fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PledgeFormErrors {
    pub amount: Option<String>,
    pub reward: Option<String>,
    pub provider: Option<String>,
}

impl PledgeFormErrors {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.reward.is_none() && self.provider.is_none()
    }

    pub fn reward_unavailable() -> Self {
        PledgeFormErrors {
            reward: Some(MSG_REWARD_UNAVAILABLE.to_string()),
            ..Default::default()
        }
    }
}

/// A back form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPledge {
    pub amount: Currency,
    pub reward_id: Option<Uuid>,
    pub provider: PaymentProvider,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validate a back form against the project's rewards.
///
/// The availability check here is advisory; the reservation repeats it
/// atomically with the insert.
pub fn validate_pledge_form(
    form: &PledgeForm,
    rewards: &[RewardAvailability],
) -> Result<ValidPledge, PledgeFormErrors> {
    let mut errors = PledgeFormErrors::default();

    let amount = match non_empty(&form.amount) {
        None => {
            errors.amount = Some(MSG_REQUIRED.to_string());
            None
        }
        Some(raw) => match Currency::parse(raw) {
            Ok(amount) if amount.is_positive() => Some(amount),
            _ => {
                errors.amount = Some(MSG_INVALID_AMOUNT.to_string());
                None
            }
        },
    };

    let reward = match non_empty(&form.reward) {
        None => None,
        Some(raw) => {
            let found = Uuid::parse_str(raw)
                .ok()
                .and_then(|id| rewards.iter().find(|r| r.reward.id == id));
            if found.is_none() {
                errors.reward = Some(MSG_INVALID_REWARD.to_string());
            }
            found
        }
    };

    if let Some(choice) = reward {
        if amount.is_some_and(|amount| amount < choice.reward.minimum) {
            errors.amount = Some(MSG_AMOUNT_TOO_LOW.to_string());
        }
        if !choice.is_available() {
            errors.reward = Some(MSG_REWARD_UNAVAILABLE.to_string());
        }
    }

    let provider = non_empty(&form.provider).and_then(PaymentProvider::parse);
    if provider.is_none() {
        errors.provider = Some(MSG_NO_PROVIDER.to_string());
    }

    match (amount, provider) {
        (Some(amount), Some(provider)) if errors.is_empty() => Ok(ValidPledge {
            amount,
            reward_id: reward.map(|r| r.reward.id),
            provider,
        }),
        _ => Err(errors),
    }
}
