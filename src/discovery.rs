use crate::error::CollectorError;
use crate::fetchers::PageFetcher;
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Characters left as-is in the search term; everything else is `%XX`-escaped
const SEARCH_TERM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Finds candidate recipe pages through a site's search endpoint
#[derive(Debug, Clone)]
pub struct UrlDiscovery {
    search_url: Url,
    recipe_path_marker: String,
}

impl UrlDiscovery {
    pub fn new(
        base_url: &str,
        search_path: &str,
        recipe_path_marker: impl Into<String>,
    ) -> Result<Self, CollectorError> {
        let search_url = Url::parse(base_url)
            .and_then(|base| base.join(search_path))
            .map_err(|e| CollectorError::InvalidUrl(format!("{base_url}{search_path}: {e}")))?;

        Ok(Self {
            search_url,
            recipe_path_marker: recipe_path_marker.into(),
        })
    }

    /// Search page address for `search_term`, e.g. `https://host/search?q=chicken%20soup`
    pub fn search_url(&self, search_term: &str) -> Url {
        let mut url = self.search_url.clone();
        let query = format!("q={}", utf8_percent_encode(search_term, SEARCH_TERM));
        url.set_query(Some(&query));
        url
    }

    /// Return up to `desired_count` unique recipe addresses in page order.
    ///
    /// A failed search fetch is returned as an error; callers treat it as
    /// "no candidates".
    pub async fn discover(
        &self,
        fetcher: &dyn PageFetcher,
        search_term: &str,
        desired_count: usize,
    ) -> Result<Vec<String>, CollectorError> {
        if desired_count == 0 {
            return Ok(Vec::new());
        }

        let url = self.search_url(search_term);
        info!("Searching for '{}' at {}", search_term, url);
        let body = fetcher.fetch(url.as_str()).await?;

        Ok(find_recipe_links(
            &body,
            &url,
            &self.recipe_path_marker,
            desired_count,
        ))
    }
}

/// Collect anchor targets containing `marker`, resolved against `page_url`,
/// keeping the first occurrence of each address.
pub fn find_recipe_links(html: &str, page_url: &Url, marker: &str, max_count: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("static anchor selector is valid");

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for anchor in document.select(&selector) {
        if urls.len() >= max_count {
            break;
        }

        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(marker) {
            continue;
        }

        let resolved = match page_url.join(href.trim()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!("Skipping unresolvable link {}: {}", href, e);
                continue;
            }
        };

        if seen.insert(resolved.clone()) {
            urls.push(resolved);
        }
    }

    urls
}
