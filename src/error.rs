use thiserror::Error;

/// Errors that can occur while collecting recipes
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Network failure or timeout while fetching a page
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Malformed JSON, in a structured-data block or in output
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No Recipe-typed structured data on the page
    #[error("No Recipe structured data found on {0}")]
    NotFound(String),

    /// A base or candidate URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A nutrition filter expression could not be parsed
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}
