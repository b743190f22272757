//! # Commit Signature Handler
//!
//! Entry point for one "commit pushed" event. The handler decodes the body,
//! runs the [`CommitResolver`], and only when resolution succeeded runs the
//! [`SignatureEnricher`]. Every invocation opens its own batch scope, so
//! concurrent invocations never share local references.

use crate::enricher::{EnrichmentError, SignatureEnricher};
use crate::event::CommitEvent;
use crate::resolver::{CommitResolver, ResolutionError};
use crate::sink::EntitySink;
use crate::verification::{CommitVerificationProvider, VerificationOutcome, VerificationReason};
use crate::{CommitSha, CorrelationId, ErrorCategory};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

// ============================================================================
// Invocation context
// ============================================================================

/// Per-invocation context supplied by the caller
#[derive(Debug, Clone, Copy)]
pub struct EventContext {
    pub correlation_id: CorrelationId,
    deadline: Option<Instant>,
}

impl EventContext {
    /// Context with a fresh correlation id and no deadline
    pub fn new() -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            deadline: None,
        }
    }

    /// Use an existing correlation id
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Abandon pending work once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abandon pending work once `timeout` has elapsed from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline has already passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Run `future` unless the deadline passes first.
    ///
    /// An already-expired context never polls the future.
    pub async fn within_deadline<F>(&self, future: F) -> Result<F::Output, DeadlineElapsed>
    where
        F: Future,
    {
        match self.deadline {
            None => Ok(future.await),
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return Err(DeadlineElapsed);
                }
                tokio::time::timeout_at(deadline, future)
                    .await
                    .map_err(|_| DeadlineElapsed)
            }
        }
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The caller's deadline passed before the work finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Deadline elapsed")]
pub struct DeadlineElapsed;

// ============================================================================
// Handler
// ============================================================================

/// Summary of one successfully handled event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerOutcome {
    pub correlation_id: CorrelationId,
    pub repository: String,
    pub sha: CommitSha,
    pub repo_ref: String,
    pub commit_ref: String,
    pub reason: VerificationReason,
    pub outcome: VerificationOutcome,
    pub entities_submitted: usize,
}

/// Runs resolution then enrichment for each inbound event
pub struct CommitSignatureHandler {
    resolver: CommitResolver,
    enricher: SignatureEnricher,
}

impl CommitSignatureHandler {
    /// Create handler with the sink and provider used by both steps
    pub fn new(sink: Arc<dyn EntitySink>, provider: Arc<dyn CommitVerificationProvider>) -> Self {
        Self {
            resolver: CommitResolver::new(sink.clone()),
            enricher: SignatureEnricher::new(provider, sink),
        }
    }

    /// Handle a raw event body
    ///
    /// # Errors
    ///
    /// - `HandlerError::Resolution` if decoding fails or the repo/commit
    ///   batch is not persisted; enrichment does not run in that case
    /// - `HandlerError::Enrichment` if the provider call or the signature
    ///   submission fails
    #[instrument(skip(self, ctx, body), fields(correlation_id = %ctx.correlation_id, body_len = body.len()))]
    pub async fn handle(
        &self,
        ctx: &EventContext,
        body: &[u8],
    ) -> Result<HandlerOutcome, HandlerError> {
        let event = CommitEvent::decode(body).map_err(|e| {
            warn!(error = %e, "Rejected commit event");
            ResolutionError::from(e)
        })?;

        self.handle_event(ctx, &event).await
    }

    /// Handle an already-decoded event
    pub async fn handle_event(
        &self,
        ctx: &EventContext,
        event: &CommitEvent,
    ) -> Result<HandlerOutcome, HandlerError> {
        let resolution = self.resolver.resolve(ctx, event).await?;
        let signature = self.enricher.enrich(ctx, &resolution.commit).await?;

        let outcome = HandlerOutcome {
            correlation_id: ctx.correlation_id,
            repository: event.repo.full_name(),
            sha: event.sha.clone(),
            repo_ref: resolution.commit.repo_ref.as_symbol(),
            commit_ref: resolution.commit.commit_ref.as_symbol(),
            reason: signature.reason,
            outcome: signature.reason.outcome(),
            entities_submitted: 3,
        };

        info!(
            repository = %outcome.repository,
            sha = %outcome.sha.short(),
            reason = %outcome.reason,
            "Commit event handled"
        );

        Ok(outcome)
    }
}

/// Failure of either processing step
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Commit resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Signature enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),
}

impl HandlerError {
    /// Check if error is transient and the event may be re-delivered
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Resolution(e) => e.is_transient(),
            Self::Enrichment(e) => e.is_transient(),
        }
    }

    /// Get error category for classification
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Resolution(e) => e.error_category(),
            Self::Enrichment(e) => e.error_category(),
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
