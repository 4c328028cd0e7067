use crate::extract::ExtractError;
use crate::storage::StorageError;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The page answered, but not with a success status.
    #[error("Fetch failed for {url}: HTTP {status}")]
    FetchFailure { url: Url, status: u16 },

    #[error("Extraction error: {0}")]
    ExtractionError(#[from] ExtractError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

pub type ScraperResult<T> = Result<T, ScraperError>;
