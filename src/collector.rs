use crate::config::CollectorConfig;
use crate::discovery::UrlDiscovery;
use crate::error::CollectorError;
use crate::extractors::{Extractor, JsonLdExtractor, ParsingContext};
use crate::fetchers::{PageFetcher, RequestFetcher};
use crate::filter::{evaluate, FilterSpec, Rejection};
use crate::model::RecipeRecord;
use log::{debug, info, warn};
use std::error::Error;
use std::time::Duration;

/// Candidates requested per wanted recipe, to absorb rejections
const OVERFETCH_FACTOR: usize = 2;

/// Receives every accepted recipe, e.g. to store it or download its image.
///
/// The record is mutable so an implementation can fill in `image_path`.
pub trait RecipeSink: Send {
    fn store(&mut self, record: &mut RecipeRecord) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Sink that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl RecipeSink for DiscardSink {
    fn store(&mut self, _record: &mut RecipeRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// What to collect in one run
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub search_term: String,
    pub target_count: usize,
    pub filter: FilterSpec,
}

impl CollectRequest {
    pub fn new(search_term: impl Into<String>, target_count: usize, filter: FilterSpec) -> Self {
        Self {
            search_term: search_term.into(),
            target_count,
            filter,
        }
    }
}

/// Result of processing one candidate address
#[derive(Debug)]
pub enum CandidateOutcome {
    Accepted(RecipeRecord),
    Rejected(Rejection),
    Failed(CollectorError),
}

/// Drives discovery, extraction and filtering for a search term
pub struct RecipeCollector {
    fetcher: Box<dyn PageFetcher>,
    discovery: UrlDiscovery,
    extractor: Box<dyn Extractor + Send + Sync>,
}

impl RecipeCollector {
    pub fn builder() -> RecipeCollectorBuilder {
        RecipeCollectorBuilder::default()
    }

    /// Collect up to `request.target_count` matching recipes.
    ///
    /// Failures on individual candidates are logged and skipped, so a short
    /// (or empty) result is not an error.
    pub async fn collect(
        &self,
        request: &CollectRequest,
        sink: &mut dyn RecipeSink,
    ) -> Vec<RecipeRecord> {
        let target = request.target_count;
        if target == 0 {
            return Vec::new();
        }

        let candidates = match self
            .discovery
            .discover(
                self.fetcher.as_ref(),
                &request.search_term,
                target.saturating_mul(OVERFETCH_FACTOR),
            )
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Search for '{}' failed: {}", request.search_term, e);
                Vec::new()
            }
        };
        info!(
            "Found {} recipe URLs for '{}'",
            candidates.len(),
            request.search_term
        );

        let mut collected: Vec<RecipeRecord> = Vec::with_capacity(target);
        for url in candidates {
            if collected.len() >= target {
                break;
            }

            match self.process_candidate(&url, &request.filter).await {
                CandidateOutcome::Accepted(mut record) => {
                    if let Err(e) = sink.store(&mut record) {
                        warn!("Failed to store {}: {}", record.display_title(), e);
                    }
                    info!("Accepted: {} ({})", record.display_title(), record.url);
                    collected.push(record);
                }
                CandidateOutcome::Rejected(reason) => {
                    info!("Skipped {}: {}", url, reason);
                }
                CandidateOutcome::Failed(e) => {
                    warn!("Skipped {}: {}", url, e);
                }
            }
        }

        if collected.len() < target {
            info!(
                "Only {} of {} requested recipes matched",
                collected.len(),
                target
            );
        }
        collected
    }

    /// Fetch, extract and filter a single candidate
    pub async fn process_candidate(&self, url: &str, filter: &FilterSpec) -> CandidateOutcome {
        debug!("Checking {}", url);
        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) => return CandidateOutcome::Failed(e),
        };

        let record = match self.extract(url, &body) {
            Ok(record) => record,
            Err(e) => return CandidateOutcome::Failed(e),
        };

        match evaluate(&record, filter) {
            Ok(()) => CandidateOutcome::Accepted(record),
            Err(reason) => CandidateOutcome::Rejected(reason),
        }
    }

    fn extract(&self, url: &str, body: &str) -> Result<RecipeRecord, CollectorError> {
        let context = ParsingContext::new(url, body);
        self.extractor.parse(&context)
    }
}

/// Builder for [`RecipeCollector`]
#[derive(Default)]
pub struct RecipeCollectorBuilder {
    config: Option<CollectorConfig>,
    fetcher: Option<Box<dyn PageFetcher>>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl RecipeCollectorBuilder {
    /// Use settings from a loaded configuration
    pub fn config(mut self, config: CollectorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom page fetcher instead of the HTTP client
    pub fn fetcher(mut self, fetcher: impl PageFetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Override the site searched for recipes
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the per-request timeout
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// # Errors
    /// Returns `CollectorError` if the base URL is invalid or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<RecipeCollector, CollectorError> {
        let config = self.config.unwrap_or_default();
        let base_url = self.base_url.unwrap_or_else(|| config.base_url.clone());
        let discovery = UrlDiscovery::new(
            &base_url,
            &config.search_path,
            config.recipe_path_marker.clone(),
        )?;

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(RequestFetcher::new(
                Some(self.timeout.unwrap_or_else(|| config.timeout())),
                config.user_agent.as_deref(),
            )?),
        };

        Ok(RecipeCollector {
            fetcher,
            discovery,
            extractor: Box::new(JsonLdExtractor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{NutrientField, NutritionPredicate};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Serves canned pages and records every requested address
    #[derive(Clone, Default)]
    struct FakeFetcher {
        pages: Arc<HashMap<String, String>>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFetcher {
        fn new(pages: Vec<(String, String)>) -> Self {
            Self {
                pages: Arc::new(pages.into_iter().collect()),
                requested: Arc::default(),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CollectorError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| CollectorError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    const BASE: &str = "https://recipes.test";
    const SEARCH: &str = "https://recipes.test/search?q=chicken";

    fn search_page(count: usize) -> String {
        (1..=count)
            .map(|i| format!(r#"<a href="/recipe/{i}/">Recipe {i}</a>"#))
            .collect()
    }

    fn recipe_page(name: &str, ingredient: &str, protein: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">
            {{"@type": "Recipe", "name": "{name}", "recipeIngredient": ["{ingredient}"],
              "nutrition": {{"proteinContent": "{protein}"}}}}
            </script></head></html>"#
        )
    }

    fn page(i: usize) -> String {
        format!("{BASE}/recipe/{i}/")
    }

    fn collector(fetcher: FakeFetcher) -> RecipeCollector {
        RecipeCollector::builder()
            .base_url(BASE)
            .fetcher(fetcher)
            .build()
            .unwrap()
    }

    fn protein_filter() -> FilterSpec {
        FilterSpec::new(
            ["milk"],
            vec![NutritionPredicate::at_least(NutrientField::ProteinContent, 20.0)],
        )
    }

    struct CountingSink(usize);

    impl RecipeSink for CountingSink {
        fn store(&mut self, record: &mut RecipeRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.0 += 1;
            record.image_path = Some(format!("/tmp/{}.jpg", self.0).into());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_collect_stops_at_target() {
        let fetcher = FakeFetcher::new(vec![
            (SEARCH.to_string(), search_page(4)),
            (page(1), recipe_page("One", "chicken", "25 g")),
            (page(2), recipe_page("Two", "whole milk", "25 g")),
            (page(3), recipe_page("Three", "chicken", "30 g")),
            (page(4), recipe_page("Four", "chicken", "30 g")),
        ]);

        let request = CollectRequest::new("chicken", 2, protein_filter());
        let mut sink = CountingSink(0);
        let recipes = collector(fetcher.clone()).collect(&request, &mut sink).await;

        let titles: Vec<_> = recipes.iter().map(|r| r.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
        assert_eq!(sink.0, 2);
        assert!(recipes[0].image_path.is_some());
        // Page 4 is never fetched once the budget is met
        assert_eq!(fetcher.requested(), vec![SEARCH.to_string(), page(1), page(2), page(3)]);
    }

    #[tokio::test]
    async fn test_collect_skips_failures() {
        let fetcher = FakeFetcher::new(vec![
            (SEARCH.to_string(), search_page(4)),
            (page(1), "<html><body>no structured data</body></html>".to_string()),
            (page(2), recipe_page("Two", "chicken", "unknown")),
            (page(3), recipe_page("Three", "chicken", "21 g")),
        ]);

        let request = CollectRequest::new("chicken", 3, protein_filter());
        let recipes = collector(fetcher).collect(&request, &mut DiscardSink).await;

        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].url, page(3));
    }

    #[tokio::test]
    async fn test_collect_requests_twice_the_target() {
        let fetcher = FakeFetcher::new(vec![(SEARCH.to_string(), search_page(10))]);

        let request = CollectRequest::new("chicken", 3, FilterSpec::default());
        let recipes = collector(fetcher.clone()).collect(&request, &mut DiscardSink).await;

        assert!(recipes.is_empty());
        let requested = fetcher.requested();
        assert_eq!(requested.len(), 1 + 6);
        assert_eq!(requested.last(), Some(&page(6)));
    }

    #[tokio::test]
    async fn test_failed_search_yields_no_recipes() {
        let fetcher = FakeFetcher::new(vec![]);
        let request = CollectRequest::new("chicken", 2, FilterSpec::default());
        let recipes = collector(fetcher.clone()).collect(&request, &mut DiscardSink).await;

        assert!(recipes.is_empty());
        assert_eq!(fetcher.requested(), vec![SEARCH.to_string()]);
    }

    #[tokio::test]
    async fn test_zero_target_fetches_nothing() {
        let fetcher = FakeFetcher::new(vec![(SEARCH.to_string(), search_page(2))]);
        let request = CollectRequest::new("chicken", 0, FilterSpec::default());
        let recipes = collector(fetcher.clone()).collect(&request, &mut DiscardSink).await;

        assert!(recipes.is_empty());
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_process_candidate_outcomes() {
        let fetcher = FakeFetcher::new(vec![
            (page(1), recipe_page("One", "chicken", "25 g")),
            (page(2), recipe_page("Two", "milk", "25 g")),
        ]);
        let collector = collector(fetcher);
        let filter = protein_filter();

        assert!(matches!(
            collector.process_candidate(&page(1), &filter).await,
            CandidateOutcome::Accepted(_)
        ));
        assert!(matches!(
            collector.process_candidate(&page(2), &filter).await,
            CandidateOutcome::Rejected(Rejection::BannedIngredient(_))
        ));
        assert!(matches!(
            collector.process_candidate(&page(3), &filter).await,
            CandidateOutcome::Failed(CollectorError::HttpStatus { status: 404, .. })
        ));
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        let result = RecipeCollector::builder()
            .base_url("::not a url::")
            .fetcher(FakeFetcher::default())
            .build();
        assert!(matches!(result, Err(CollectorError::InvalidUrl(_))));
    }
}
