//! Shared utilities, configuration, and error handling for Crowdfund
//!
//! This crate provides common functionality used across the Crowdfund application:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - The `Currency` money type
//! - Request extractors shared by the HTTP layers

pub mod config;
pub mod currency;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use currency::{Currency, CurrencyError};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
