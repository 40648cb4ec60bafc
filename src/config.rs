//! Configuration
//!
//! Everything is read once into [`EvaluatorConfig`] and handed to the
//! components that need it.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::agent::{ModelSelection, DEFAULT_MODEL};
use crate::services::CompositeOptions;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    pub data_dir: PathBuf,
    pub api_key: Option<String>,
    pub base_url: String,
    pub models: ModelSelection,
    pub max_images: usize,
    pub fetch_concurrency: usize,
    pub fetch_timeout: Duration,
    /// Listings evaluated at once by a batch run
    pub batch_concurrency: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            models: ModelSelection::default(),
            max_images: 36,
            fetch_concurrency: 10,
            fetch_timeout: Duration::from_secs(30),
            batch_concurrency: 1,
        }
    }
}

impl EvaluatorConfig {
    /// Read the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or blank keys keep their
    /// defaults; malformed numbers are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            data_dir: get("HOUSE_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            api_key: get("OPENROUTER_API_KEY"),
            base_url: get("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            models: ModelSelection {
                vision_model: get("HOUSE_VISION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                text_model: get("HOUSE_TEXT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            max_images: parse_or(get("HOUSE_MAX_IMAGES"), "HOUSE_MAX_IMAGES", defaults.max_images)?,
            fetch_concurrency: parse_or(
                get("HOUSE_FETCH_CONCURRENCY"),
                "HOUSE_FETCH_CONCURRENCY",
                defaults.fetch_concurrency,
            )?,
            fetch_timeout: Duration::from_secs(parse_or(
                get("HOUSE_FETCH_TIMEOUT_SECS"),
                "HOUSE_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            batch_concurrency: parse_or(
                get("HOUSE_BATCH_CONCURRENCY"),
                "HOUSE_BATCH_CONCURRENCY",
                defaults.batch_concurrency,
            )?,
        })
    }

    pub fn composite_options(&self) -> CompositeOptions {
        CompositeOptions {
            max_images: Some(self.max_images),
            concurrency: self.fetch_concurrency,
            ..CompositeOptions::default()
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("OPENROUTER_API_KEY environment variable required")
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, value)),
        None => Ok(default),
    }
}
