use super::base::{StorageBackend, StorageError, StorageItem};
use async_trait::async_trait;
use erased_serde::Serialize as ErasedSerialize;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Keeps stored items in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<Vec<StorageItem<Value>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<StorageItem<Value>> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Stored payloads deserialized back into `T`, in insertion order.
    pub fn data<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        self.items
            .lock()
            .iter()
            .map(|item| serde_json::from_value(item.data.clone()).map_err(StorageError::from))
            .collect()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn store_serialized(
        &self,
        item: StorageItem<Box<dyn ErasedSerialize + Send + Sync>>,
    ) -> Result<(), StorageError> {
        let data = serde_json::to_value(&item.data)?;
        self.items.lock().push(StorageItem {
            url: item.url,
            timestamp: item.timestamp,
            data,
        });
        Ok(())
    }
}
