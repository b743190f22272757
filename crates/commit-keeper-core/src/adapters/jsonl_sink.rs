//! # JSON Lines Sink
//!
//! Writes each accepted batch as one JSON array on its own line, either to a
//! file (appending) or to standard output. A batch is serialized completely
//! before anything is written, so a failed batch leaves no partial line.

use crate::batch::EntityBatch;
use crate::sink::{EntitySink, SinkError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

/// Line-oriented JSON sink
///
/// # Examples
///
/// ```no_run
/// use commit_keeper_core::adapters::JsonLinesSink;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = JsonLinesSink::open("./data/entities.jsonl").await?;
/// # Ok(())
/// # }
/// ```
pub struct JsonLinesSink {
    destination: Option<PathBuf>,
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonLinesSink {
    /// Append to the file at `path`, creating it and its parent directories
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Io` if the directory or file cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(Self {
            destination: Some(path.to_path_buf()),
            writer: Mutex::new(Box::new(file)),
        })
    }

    /// Write to standard output
    pub fn stdout() -> Self {
        Self {
            destination: None,
            writer: Mutex::new(Box::new(tokio::io::stdout())),
        }
    }

    /// File being appended to, `None` for standard output
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }
}

#[async_trait]
impl EntitySink for JsonLinesSink {
    async fn transact(&self, batch: &EntityBatch) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(batch)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;

        debug!(
            scope = %batch.scope(),
            entities = batch.len(),
            bytes = line.len(),
            "Batch written as JSON line"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "jsonl_sink_tests.rs"]
mod tests;
