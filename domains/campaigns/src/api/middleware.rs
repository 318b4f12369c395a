//! Campaigns domain state and auth backend integration

use axum::extract::FromRef;
use crowdfund_auth::AuthBackend;
use crowdfund_common::config::SiteConfig;
use crowdfund_email::EmailService;
use std::sync::Arc;

use crate::api::content::ContentPipeline;
use crate::domain::entities::PaymentProvider;
use crate::CampaignRepositories;

/// Application state for the campaigns domain
#[derive(Clone)]
pub struct CampaignsState {
    pub repos: CampaignRepositories,
    pub auth: AuthBackend,
    pub email: Arc<dyn EmailService>,
    pub site: SiteConfig,
    pub content: ContentPipeline,
}

impl CampaignsState {
    /// Where the visitor is sent to pay through `provider`
    pub fn provider_url(&self, provider: PaymentProvider) -> &str {
        match provider {
            PaymentProvider::Paypal => &self.site.payments.paypal_url,
            PaymentProvider::Postfinance => &self.site.payments.postfinance_url,
        }
    }

    /// Format an amount with the site currency, e.g. `25.00 CHF`
    pub fn money(&self, amount: impl std::fmt::Display) -> String {
        format!("{} {}", amount, self.site.currency_code)
    }
}

impl FromRef<CampaignsState> for AuthBackend {
    fn from_ref(state: &CampaignsState) -> Self {
        state.auth.clone()
    }
}
