//! # Commit Resolver
//!
//! First processing step. Turns a [`CommitEvent`] into the `git/repo` and
//! `git/commit` entities, submits them as one ordered batch, and hands the
//! resolved commit (with its batch scope) to the enricher.

use crate::batch::{BatchError, BatchScope, LocalRef};
use crate::entities::{GitCommitEntity, GitRepoEntity};
use crate::event::{CommitEvent, EventError, RepoCoordinates};
use crate::handler::EventContext;
use crate::sink::{EntitySink, SinkError};
use crate::{CommitSha, ErrorCategory, InstallationCredential};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Symbolic name of the repository reference
pub const REPO_REF: &str = "repo";

/// Symbolic name of the commit reference
pub const COMMIT_REF: &str = "commit";

/// A commit whose repo and commit entities were accepted by the sink
#[derive(Debug, Clone)]
pub struct ResolvedCommit {
    pub event: CommitEvent,
    pub repo_ref: LocalRef,
    pub commit_ref: LocalRef,
    pub scope: BatchScope,
}

impl ResolvedCommit {
    pub fn sha(&self) -> &CommitSha {
        &self.event.sha
    }

    pub fn repo(&self) -> &RepoCoordinates {
        &self.event.repo
    }

    pub fn credential(&self) -> &InstallationCredential {
        &self.event.credential
    }
}

/// Result of [`CommitResolver::resolve`]
#[derive(Debug, Clone)]
pub struct Resolution {
    pub commit: ResolvedCommit,
    pub repo_entity: GitRepoEntity,
    pub commit_entity: GitCommitEntity,
}

/// Submits repository and commit entities for an event
pub struct CommitResolver {
    sink: Arc<dyn EntitySink>,
}

impl CommitResolver {
    pub fn new(sink: Arc<dyn EntitySink>) -> Self {
        Self { sink }
    }

    /// Build and submit `[repo, commit]` for `event`
    ///
    /// # Errors
    ///
    /// - `Sink` if the batch was not persisted
    /// - `Cancelled` if the context deadline passed first
    #[instrument(skip(self, ctx, event), fields(
        correlation_id = %ctx.correlation_id,
        repository = %event.repo.full_name(),
        sha = %event.sha.short(),
    ))]
    pub async fn resolve(
        &self,
        ctx: &EventContext,
        event: &CommitEvent,
    ) -> Result<Resolution, ResolutionError> {
        let mut scope = BatchScope::new();
        let repo_ref = scope.local_ref(REPO_REF);
        let commit_ref = scope.local_ref(COMMIT_REF);

        let repo_entity = GitRepoEntity {
            entity: repo_ref.clone(),
            source_id: event.source_id.clone(),
            url: event.repo.provider_url.clone(),
        };
        let commit_entity = GitCommitEntity {
            entity: commit_ref.clone(),
            repo: repo_ref.clone(),
            sha: event.sha.clone(),
            url: event.repo.provider_url.clone(),
        };

        let mut batch = scope.begin();
        batch.push(repo_entity.clone())?;
        batch.push(commit_entity.clone())?;

        debug!(scope = %scope.id(), entities = batch.len(), "Submitting repo and commit");

        ctx.within_deadline(self.sink.transact(&batch))
            .await
            .map_err(|_| {
                warn!("Deadline elapsed while submitting repo and commit");
                ResolutionError::Cancelled
            })?
            .map_err(|e| {
                warn!(error = %e, "Sink rejected repo and commit");
                ResolutionError::Sink(e)
            })?;

        scope.commit(&batch)?;

        info!(
            source_id = %event.source_id,
            provider_url = %event.repo.provider_url,
            "Repo and commit submitted"
        );

        Ok(Resolution {
            commit: ResolvedCommit {
                event: event.clone(),
                repo_ref,
                commit_ref,
                scope,
            },
            repo_entity,
            commit_entity,
        })
    }
}

/// Errors from the resolution step
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid commit event: {0}")]
    InvalidEvent(EventError),

    #[error("Batch construction failed: {0}")]
    Batch(#[from] BatchError),

    #[error("Sink submission failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Resolution cancelled: deadline elapsed")]
    Cancelled,
}

impl From<EventError> for ResolutionError {
    fn from(error: EventError) -> Self {
        match error {
            EventError::MissingField { field } => Self::MissingField { field },
            other => Self::InvalidEvent(other),
        }
    }
}

impl ResolutionError {
    /// Check if error is transient and the event may be re-delivered
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sink(e) => e.is_transient(),
            Self::Cancelled => true,
            _ => false,
        }
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

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
