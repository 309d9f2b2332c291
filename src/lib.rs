//! Discover recipe pages for a search term, extract their schema.org Recipe
//! data and keep the ones that pass ingredient and nutrition filters.
//!
//! ```no_run
//! use recipe_collector::{collect_recipes, FilterSpec, NutrientField, NutritionPredicate};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let filter = FilterSpec::new(
//!     ["milk", "peanuts"],
//!     vec![NutritionPredicate::at_least(NutrientField::ProteinContent, 20.0)],
//! );
//! let recipes = collect_recipes("chicken", 5, filter).await?;
//! for recipe in &recipes {
//!     println!("{}", recipe.display_title());
//! }
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod filter;
pub mod model;
pub mod nutrition;

pub use collector::{
    CandidateOutcome, CollectRequest, DiscardSink, RecipeCollector, RecipeCollectorBuilder,
    RecipeSink,
};
pub use config::CollectorConfig;
pub use discovery::UrlDiscovery;
pub use error::CollectorError;
pub use extractors::extract_recipe;
pub use fetchers::{PageFetcher, RequestFetcher};
pub use filter::{
    evaluate, matches, Comparator, FilterSpec, NutrientField, NutritionPredicate, Rejection,
};
pub use model::RecipeRecord;
pub use nutrition::{parse_nutrition_value, Unparsable};

/// Collect up to `target_count` recipes for `search_term` with the default
/// configuration.
///
/// # Errors
/// Only fails if the HTTP client cannot be created; individual page failures
/// just shorten the result.
pub async fn collect_recipes(
    search_term: &str,
    target_count: usize,
    filter: FilterSpec,
) -> Result<Vec<RecipeRecord>, CollectorError> {
    let collector = RecipeCollector::builder().build()?;
    let request = CollectRequest::new(search_term, target_count, filter);
    Ok(collector.collect(&request, &mut DiscardSink).await)
}
