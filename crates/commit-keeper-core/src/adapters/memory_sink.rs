//! # In-Memory Sink
//!
//! Thread-safe in-memory sink for testing and development. Emulates the
//! knowledge store's reference resolution: a batch is only accepted when
//! each entity's references were declared earlier in the batch or by an
//! accepted batch of the same scope.

use crate::batch::{EntityBatch, ScopeId};
use crate::entities::Entity;
use crate::sink::{EntitySink, SinkError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory transactional sink
#[derive(Clone, Default)]
pub struct InMemorySink {
    state: Arc<Mutex<SinkState>>,
}

#[derive(Default)]
struct SinkState {
    batches: Vec<Vec<Entity>>,
    declared: HashMap<ScopeId, HashSet<String>>,
    attempts: usize,
    failure: Option<Failure>,
}

struct Failure {
    accept_first: usize,
    message: String,
}

impl InMemorySink {
    /// Create new empty sink that accepts every valid batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every batch with `message`
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self::failing_after(0, message)
    }

    /// Sink that accepts the first `accept_first` batches, then rejects
    pub fn failing_after(accept_first: usize, message: impl Into<String>) -> Self {
        let state = SinkState {
            failure: Some(Failure {
                accept_first,
                message: message.into(),
            }),
            ..SinkState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Accepted batches in submission order
    pub async fn batches(&self) -> Vec<Vec<Entity>> {
        self.state.lock().await.batches.clone()
    }

    /// All accepted entities in submission order
    pub async fn entities(&self) -> Vec<Entity> {
        self.state
            .lock()
            .await
            .batches
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of `transact` calls, accepted or not
    pub async fn attempts(&self) -> usize {
        self.state.lock().await.attempts
    }
}

#[async_trait]
impl EntitySink for InMemorySink {
    async fn transact(&self, batch: &EntityBatch) -> Result<(), SinkError> {
        let mut state = self.state.lock().await;
        state.attempts += 1;

        if let Some(failure) = &state.failure {
            if state.batches.len() >= failure.accept_first {
                return Err(SinkError::Rejected {
                    message: failure.message.clone(),
                });
            }
        }

        let mut known = state
            .declared
            .get(&batch.scope())
            .cloned()
            .unwrap_or_default();

        for entity in batch.entities() {
            for reference in entity.references() {
                if !known.contains(reference.name()) {
                    return Err(SinkError::UnresolvedReference {
                        reference: reference.as_symbol(),
                    });
                }
            }
            if let Some(declared) = entity.declares() {
                known.insert(declared.name().to_string());
            }
        }

        state.declared.insert(batch.scope(), known);
        state.batches.push(batch.entities().to_vec());

        debug!(
            scope = %batch.scope(),
            entities = batch.len(),
            "Batch stored in memory"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_sink_tests.rs"]
mod tests;
