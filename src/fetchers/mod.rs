mod request;

pub use request::RequestFetcher;

use crate::error::CollectorError;
use async_trait::async_trait;

/// Retrieves page bodies for discovery and extraction
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of `url`. Network errors, timeouts and non-success
    /// statuses are all errors.
    async fn fetch(&self, url: &str) -> Result<String, CollectorError>;
}
