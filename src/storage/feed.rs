use super::base::{StorageBackend, StorageError, StorageItem};
use async_trait::async_trait;
use erased_serde::Serialize as ErasedSerialize;
use log::{debug, info};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFormat {
    /// One JSON array, written when the feed is finished.
    #[default]
    Json,
    /// One JSON object per line, appended as items arrive.
    JsonLines,
}

impl FromStr for FeedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(FeedFormat::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(FeedFormat::JsonLines),
            other => Err(format!("unknown feed format {other:?} (expected json or jsonl)")),
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedFormat::Json => write!(f, "json"),
            FeedFormat::JsonLines => write!(f, "jsonl"),
        }
    }
}

enum FeedState {
    Buffered(Vec<Value>),
    Streaming(BufWriter<File>),
}

/// Writes item payloads to a single feed file.
///
/// The file is truncated when the feed is created.
pub struct FeedStorage {
    path: PathBuf,
    format: FeedFormat,
    state: Mutex<FeedState>,
}

impl FeedStorage {
    pub fn new<P: AsRef<Path>>(path: P, format: FeedFormat) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let state = match format {
            FeedFormat::Json => FeedState::Buffered(Vec::new()),
            FeedFormat::JsonLines => FeedState::Streaming(BufWriter::new(file)),
        };
        info!("Writing {} feed to {}", format, path.display());

        Ok(Self {
            path,
            format,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FeedFormat {
        self.format
    }
}

#[async_trait]
impl StorageBackend for FeedStorage {
    async fn store_serialized(
        &self,
        item: StorageItem<Box<dyn ErasedSerialize + Send + Sync>>,
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(&item.data)?;
        debug!("Storing item from {} in {}", item.url, self.path.display());

        match &mut *self.state.lock() {
            FeedState::Buffered(items) => items.push(value),
            FeedState::Streaming(writer) => {
                serde_json::to_writer(&mut *writer, &value)?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    async fn finish(&self) -> Result<(), StorageError> {
        match &mut *self.state.lock() {
            FeedState::Buffered(items) => {
                let json = serde_json::to_string_pretty(items)?;
                fs::write(&self.path, json)?;
                info!("Wrote {} items to {}", items.len(), self.path.display());
            }
            FeedState::Streaming(writer) => writer.flush()?,
        }
        Ok(())
    }
}
