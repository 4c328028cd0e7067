use super::base::{StorageBackend, StorageError, StorageItem};
use async_trait::async_trait;
use erased_serde::Serialize as ErasedSerialize;
use parking_lot::Mutex;
use std::io::{self, Stdout, Write};
use std::sync::Arc;

/// Writes each payload as one JSON line, to stdout unless another writer is given.
pub struct ConsoleStorage<W = Stdout> {
    out: Arc<Mutex<W>>,
}

impl ConsoleStorage<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleStorage<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleStorage<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }
}

impl<W> Clone for ConsoleStorage<W> {
    fn clone(&self) -> Self {
        Self {
            out: Arc::clone(&self.out),
        }
    }
}

#[async_trait]
impl<W: Write + Send + 'static> StorageBackend for ConsoleStorage<W> {
    async fn store_serialized(
        &self,
        item: StorageItem<Box<dyn ErasedSerialize + Send + Sync>>,
    ) -> Result<(), StorageError> {
        let line = serde_json::to_string(&item.data)?;
        writeln!(self.out.lock(), "{line}")?;
        Ok(())
    }

    async fn finish(&self) -> Result<(), StorageError> {
        self.out.lock().flush()?;
        Ok(())
    }
}
