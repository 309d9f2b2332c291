use crate::error::CollectorError;
use crate::filter::{FilterSpec, NutritionPredicate};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Collector configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectorConfig {
    /// Site that hosts the search endpoint and recipe pages
    pub base_url: String,
    /// Path of the search endpoint, queried with `?q=<term>`
    pub search_path: String,
    /// Substring a link must contain to count as a recipe page
    pub recipe_path_marker: String,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// User agent sent with every request
    pub user_agent: Option<String>,
    /// Default filters applied to every collection
    pub filter: FilterConfig,
}

/// Default banned ingredients and nutrition limits
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FilterConfig {
    pub banned_ingredients: Vec<String>,
    /// Predicate expressions such as `"proteinContent >= 20"`
    pub nutrition: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            recipe_path_marker: default_recipe_path_marker(),
            timeout: default_timeout(),
            user_agent: None,
            filter: FilterConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.allrecipes.com".to_string()
}

fn default_search_path() -> String {
    "/search".to_string()
}

fn default_recipe_path_marker() -> String {
    "/recipe/".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl CollectorConfig {
    /// Load configuration from `recipe-collector.toml` and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        load_config(None)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Parse the configured default filters
    pub fn filter_spec(&self) -> Result<FilterSpec, CollectorError> {
        let predicates = self
            .filter
            .nutrition
            .iter()
            .map(|expr| expr.parse::<NutritionPredicate>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FilterSpec::new(&self.filter.banned_ingredients, predicates))
    }
}

/// Load configuration from file and environment variables
///
/// Configuration is loaded with the following priority (highest to lowest):
/// 1. Environment variables with RECIPE_COLLECTOR__ prefix
/// 2. The given file, or recipe-collector.toml in the current directory
/// 3. Default values
///
/// Environment variable format: RECIPE_COLLECTOR__FILTER__BANNED_INGREDIENTS
pub fn load_config(path: Option<&Path>) -> Result<CollectorConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("recipe-collector").required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("RECIPE_COLLECTOR")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("filter.banned_ingredients")
                .with_list_parse_key("filter.nutrition")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
