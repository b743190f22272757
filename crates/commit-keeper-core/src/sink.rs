//! # Transactional Sink
//!
//! Port for the knowledge store. A sink accepts an [`EntityBatch`] and
//! either persists every entity in it or none of them.

use crate::batch::EntityBatch;
use crate::ErrorCategory;
use async_trait::async_trait;

/// Persistence boundary for entity batches
#[async_trait]
pub trait EntitySink: Send + Sync {
    /// Persist the whole batch atomically
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the batch was not persisted. In that case no
    /// entity of the batch is visible in the store.
    async fn transact(&self, batch: &EntityBatch) -> Result<(), SinkError>;
}

/// Errors from a sink submission
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Batch rejected: {message}")]
    Rejected { message: String },

    #[error("Sink unavailable: {message}")]
    Unavailable { message: String },

    #[error("Unresolved local reference: {reference}")]
    UnresolvedReference { reference: String },

    #[error("Failed to serialize batch: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Check if error is transient and the event may be re-delivered
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io(_))
    }

    /// Get error category for classification
    pub fn error_category(&self) -> ErrorCategory {
        if self.is_transient() {
            ErrorCategory::Transient
        } else {
            ErrorCategory::Permanent
        }
    }
}
