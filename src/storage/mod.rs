pub mod base;
pub mod console;
pub mod factory;
pub mod feed;
pub mod memory;

pub use base::{IntoStorageData, StorageBackend, StorageError, StorageItem};
pub use console::ConsoleStorage;
pub use factory::{create_storage, Storage, StorageType};
pub use feed::{FeedFormat, FeedStorage};
pub use memory::MemoryStorage;
