use async_trait::async_trait;
use chrono::{DateTime, Utc};
use erased_serde::Serialize as ErasedSerialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Storage operation error: {0}")]
    OperationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

/// A scraped value and the page it came from.
#[derive(Debug, Clone, Serialize)]
pub struct StorageItem<T: Serialize> {
    pub url: Url,
    pub timestamp: DateTime<Utc>,
    pub data: T,
}

impl<T: Serialize + Send + Sync + 'static> StorageItem<T> {
    pub fn new(url: Url, data: T) -> Self {
        Self {
            url,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn erase(self) -> StorageItem<Box<dyn ErasedSerialize + Send + Sync>> {
        StorageItem {
            url: self.url,
            timestamp: self.timestamp,
            data: self.data.into_storage_data(),
        }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn store_serialized(
        &self,
        item: StorageItem<Box<dyn ErasedSerialize + Send + Sync>>,
    ) -> Result<(), StorageError>;

    /// Flushes anything buffered. Called once when the crawl ends.
    async fn finish(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

pub trait IntoStorageData {
    fn into_storage_data(self) -> Box<dyn ErasedSerialize + Send + Sync>;
}

impl<T: Serialize + Send + Sync + 'static> IntoStorageData for T {
    fn into_storage_data(self) -> Box<dyn ErasedSerialize + Send + Sync> {
        Box::new(self)
    }
}
