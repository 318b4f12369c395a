//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Where each payment provider sends the visitor after authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentConfig {
    pub paypal_url: String,
    pub postfinance_url: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            paypal_url: "/paypal/".to_string(),
            postfinance_url: "/postfinance/".to_string(),
        }
    }
}

/// Settings the public site needs at request time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
    /// Absolute base URL used in emails
    pub app_base_url: String,
    /// Login page of the identity provider; receives a `next` parameter
    pub login_url: String,
    /// Currency label shown next to amounts
    pub currency_code: String,
    pub payments: PaymentConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            app_base_url: "http://localhost:3000".to_string(),
            login_url: "/accounts/login/".to_string(),
            currency_code: "CHF".to_string(),
            payments: PaymentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    pub site: SiteConfig,

    /// Comma-separated list of allowed CORS origins
    pub cors_allowed_origins: Option<String>,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,

            site: SiteConfig::from_env(),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "crowdfund=debug".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}

impl SiteConfig {
    /// Session cookies are marked `Secure` when the site is served over https
    pub fn secure_cookies(&self) -> bool {
        self.app_base_url
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("https://")
    }

    /// Load site settings, falling back to defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_base_url: env::var("APP_BASE_URL").unwrap_or(defaults.app_base_url),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),
            currency_code: env::var("CURRENCY_CODE").unwrap_or(defaults.currency_code),
            payments: PaymentConfig {
                paypal_url: env::var("PAYPAL_URL").unwrap_or(defaults.payments.paypal_url),
                postfinance_url: env::var("POSTFINANCE_URL")
                    .unwrap_or(defaults.payments.postfinance_url),
            },
        }
    }
}
