use crate::error::CollectorError;
use crate::model::RecipeRecord;
use scraper::Html;

mod json_ld;

pub use self::json_ld::JsonLdExtractor;

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
}

impl ParsingContext {
    pub fn new(url: impl Into<String>, page_body: &str) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(page_body),
        }
    }
}

pub trait Extractor {
    fn parse(&self, context: &ParsingContext) -> Result<RecipeRecord, CollectorError>;
}

/// Extract a recipe from a fetched page body with the JSON-LD extractor.
///
/// Returns [`CollectorError::NotFound`] when the page has no Recipe data.
pub fn extract_recipe(page_url: &str, page_body: &str) -> Result<RecipeRecord, CollectorError> {
    let context = ParsingContext::new(page_url, page_body);
    JsonLdExtractor.parse(&context)
}
