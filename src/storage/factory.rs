use super::{
    base::StorageError, ConsoleStorage, FeedFormat, FeedStorage, MemoryStorage, StorageBackend,
    StorageItem,
};
use anyhow::Error;
use async_trait::async_trait;
use erased_serde::Serialize as ErasedSerialize;
use std::path::PathBuf;
use std::sync::Arc;

pub enum StorageType {
    Console,
    Memory(MemoryStorage),
    Feed { path: PathBuf, format: FeedFormat },
    /// Any other backend, used as is.
    Custom(Arc<dyn StorageBackend>),
}

#[derive(Clone)]
pub enum Storage {
    Console(ConsoleStorage),
    Memory(MemoryStorage),
    Feed(Arc<FeedStorage>),
    Custom(Arc<dyn StorageBackend>),
}

#[async_trait]
impl StorageBackend for Storage {
    async fn store_serialized(
        &self,
        item: StorageItem<Box<dyn ErasedSerialize + Send + Sync>>,
    ) -> Result<(), StorageError> {
        match self {
            Storage::Console(storage) => storage.store_serialized(item).await,
            Storage::Memory(storage) => storage.store_serialized(item).await,
            Storage::Feed(storage) => storage.store_serialized(item).await,
            Storage::Custom(storage) => storage.store_serialized(item).await,
        }
    }

    async fn finish(&self) -> Result<(), StorageError> {
        match self {
            Storage::Console(storage) => storage.finish().await,
            Storage::Memory(storage) => storage.finish().await,
            Storage::Feed(storage) => storage.finish().await,
            Storage::Custom(storage) => storage.finish().await,
        }
    }
}

pub fn create_storage(storage_type: StorageType) -> Result<Storage, Error> {
    match storage_type {
        StorageType::Console => Ok(Storage::Console(ConsoleStorage::new())),
        StorageType::Memory(storage) => Ok(Storage::Memory(storage)),
        StorageType::Feed { path, format } => {
            Ok(Storage::Feed(Arc::new(FeedStorage::new(path, format)?)))
        }
        StorageType::Custom(storage) => Ok(Storage::Custom(storage)),
    }
}
