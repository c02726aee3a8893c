//! Shared values and configuration for the vendor catalog scraper.
//!
//! Everything in here is plain data: the records a scrape produces
//! ([`ProductRecord`], [`CountryIndex`]) and the configuration consumed by the
//! browser session ([`AppConfig`], [`BrowserConfig`], [`Timeouts`]).

pub mod app_config;
pub mod config;
pub mod locales;
pub mod products;

pub use app_config::{AppConfig, BrowserConfig, BrowserKind, Environment, Timeouts};
pub use config::{load_app_config, load_app_config_from_env};
pub use locales::{CountryIndex, FlatCountry, Locale, Region};
pub use products::{ProductRecord, Specifications};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
