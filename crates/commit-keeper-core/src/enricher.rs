//! # Signature Enricher
//!
//! Second processing step. Asks the verification provider about the
//! resolved commit and submits a single `git.commit/signature` entity that
//! references the commit declared by the resolver.

use crate::entities::GitCommitSignatureEntity;
use crate::handler::EventContext;
use crate::resolver::ResolvedCommit;
use crate::sink::{EntitySink, SinkError};
use crate::verification::{CommitVerificationProvider, ProviderError};
use crate::{BatchError, ErrorCategory};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Fetches verification data and submits the signature entity
pub struct SignatureEnricher {
    provider: Arc<dyn CommitVerificationProvider>,
    sink: Arc<dyn EntitySink>,
}

impl SignatureEnricher {
    pub fn new(provider: Arc<dyn CommitVerificationProvider>, sink: Arc<dyn EntitySink>) -> Self {
        Self { provider, sink }
    }

    /// Fetch, map and submit the signature of `commit`
    ///
    /// # Errors
    ///
    /// - `Provider` if the verification call fails; nothing is submitted
    /// - `Batch` if `commit` was not resolved in its own scope
    /// - `Sink` if the signature batch was not persisted
    /// - `Cancelled` if the context deadline passed first
    #[instrument(skip(self, ctx, commit), fields(
        correlation_id = %ctx.correlation_id,
        repository = %commit.repo().full_name(),
        sha = %commit.sha().short(),
    ))]
    pub async fn enrich(
        &self,
        ctx: &EventContext,
        commit: &ResolvedCommit,
    ) -> Result<GitCommitSignatureEntity, EnrichmentError> {
        let verification = ctx
            .within_deadline(self.provider.commit_verification(
                commit.repo(),
                commit.credential(),
                commit.sha(),
            ))
            .await
            .map_err(|_| {
                warn!("Deadline elapsed while fetching signature verification");
                EnrichmentError::Cancelled
            })?
            .map_err(|e| {
                warn!(error = %e, "Signature verification lookup failed");
                EnrichmentError::Provider(e)
            })?;

        debug!(
            verified = verification.verified,
            reason = %verification.reason,
            outcome = ?verification.outcome(),
            "Mapped signature verification"
        );

        let entity =
            GitCommitSignatureEntity::from_verification(commit.commit_ref.clone(), &verification);

        let mut batch = commit.scope.begin();
        batch.push(entity.clone())?;

        ctx.within_deadline(self.sink.transact(&batch))
            .await
            .map_err(|_| {
                warn!("Deadline elapsed while submitting signature");
                EnrichmentError::Cancelled
            })?
            .map_err(|e| {
                warn!(error = %e, "Sink rejected signature");
                EnrichmentError::Sink(e)
            })?;

        info!(
            reason = %entity.reason,
            status = entity.status.as_str(),
            "Commit signature submitted"
        );

        Ok(entity)
    }
}

/// Errors from the enrichment step
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Verification provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Batch construction failed: {0}")]
    Batch(#[from] BatchError),

    #[error("Sink submission failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Enrichment cancelled: deadline elapsed")]
    Cancelled,
}

impl EnrichmentError {
    /// Check if error is transient and the event may be re-delivered
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::Sink(e) => e.is_transient(),
            Self::Cancelled => true,
            Self::Batch(_) => false,
        }
    }

    /// Get error category for classification
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Provider(e) => e.error_category(),
            _ if self.is_transient() => ErrorCategory::Transient,
            _ => ErrorCategory::Permanent,
        }
    }
}

#[cfg(test)]
#[path = "enricher_tests.rs"]
mod tests;
