//! # Commit-Keeper Core
//!
//! Core business logic for the commit signature skill.
//!
//! When a source-control provider reports that a commit was pushed, this crate
//! turns the notification into a small graph of knowledge-store entities:
//!
//! 1. The [`resolver::CommitResolver`] decodes the event into a normalized
//!    [`event::CommitEvent`] and submits the `git/repo` and `git/commit`
//!    entities as one batch.
//! 2. The [`enricher::SignatureEnricher`] asks the provider for the commit's
//!    signature verification and submits a `git.commit/signature` entity that
//!    references the commit submitted in step 1.
//!
//! ## Architecture
//!
//! - Business logic depends only on trait abstractions ([`sink::EntitySink`],
//!   [`verification::CommitVerificationProvider`])
//! - Infrastructure implementations are injected at runtime
//! - Local reference ids (`$repo`, `$commit`) are minted by a per-invocation
//!   [`batch::BatchScope`], so concurrent invocations never share references
//!
//! ## Usage
//!
//! ```rust
//! use commit_keeper_core::{CommitSha, SourceId};
//!
//! let sha = CommitSha::new("d2c6724307f007755fc770944fd7bc5ff55933b0").unwrap();
//! let source_id = SourceId::new("123456").unwrap();
//! assert_eq!(sha.short(), "d2c6724");
//! assert_eq!(source_id.as_str(), "123456");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use uuid::Uuid;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Git commit SHA (hexadecimal object name).
///
/// Abbreviated SHAs are accepted; the value is normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitSha(String);

impl CommitSha {
    /// Create new commit SHA with validation
    ///
    /// # Validation Rules
    /// - Must be 4-64 characters
    /// - Must contain only hexadecimal digits
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "sha".to_string(),
            });
        }

        if value.len() < 4 {
            return Err(ValidationError::TooShort {
                field: "sha".to_string(),
                min_length: 4,
            });
        }

        if value.len() > 64 {
            return Err(ValidationError::TooLong {
                field: "sha".to_string(),
                max_length: 64,
            });
        }

        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidCharacters {
                field: "sha".to_string(),
                invalid_chars: "non-hexadecimal".to_string(),
            });
        }

        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Seven-character abbreviation used in log output
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        &self.0[..end]
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommitSha {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Repository identifier assigned by the source-control system.
///
/// Kept as an opaque string because providers differ in how they number
/// repositories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    /// Create new source id, rejecting blank values
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "source_id".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base URL of the source-control provider (e.g. `https://github.com/`).
///
/// The original text is preserved verbatim because the knowledge store keys
/// providers by it; parsing is only used for validation and host lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderUrl(String);

impl ProviderUrl {
    /// Create new provider URL
    ///
    /// # Validation Rules
    /// - Must not be blank
    /// - Must parse as an absolute `http` or `https` URL
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "provider_url".to_string(),
            });
        }

        let parsed = url::Url::parse(&value).map_err(|e| ValidationError::InvalidFormat {
            field: "provider_url".to_string(),
            message: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ValidationError::InvalidFormat {
                field: "provider_url".to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self(value))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host name of the provider, if the URL has one
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
    }
}

impl fmt::Display for ProviderUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Installation-scoped access token for the provider API.
///
/// The token value is never written to logs: both `Debug` and `Display`
/// render a redacted placeholder. An empty credential means the provider is
/// called anonymously.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
pub struct InstallationCredential(String);

impl InstallationCredential {
    /// Wrap a raw token value
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// An empty credential (anonymous access)
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    /// Whether no token is present
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Raw token value, for building authorization headers only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InstallationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "InstallationCredential(<none>)")
        } else {
            write!(f, "InstallationCredential(<redacted>)")
        }
    }
}

impl fmt::Display for InstallationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<none>")
        } else {
            write!(f, "<redacted>")
        }
    }
}

/// Identifier for tracing one event through both processing steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get string representation
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = s
            .parse::<Uuid>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "correlation_id".to_string(),
                message: format!("expected UUID, got '{}'", s),
            })?;
        Ok(Self(uuid))
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization for re-delivery and alerting decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failures; the dispatcher may re-deliver the event
    Transient,
    /// Permanent failures that won't succeed on re-delivery
    Permanent,
    /// Configuration errors (credentials, endpoints)
    Configuration,
}

/// Error type for input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    TooLong { field: String, max_length: usize },

    #[error("Field '{field}' is below minimum length of {min_length}")]
    TooShort { field: String, min_length: usize },

    #[error("Field '{field}' contains invalid characters: {invalid_chars}")]
    InvalidCharacters {
        field: String,
        invalid_chars: String,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            Self::Required { field }
            | Self::InvalidFormat { field, .. }
            | Self::TooLong { field, .. }
            | Self::TooShort { field, .. }
            | Self::InvalidCharacters { field, .. } => field,
        }
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Inbound commit event decoding and normalization
pub mod event;

/// Knowledge-store entity types
pub mod entities;

/// Batch scopes and local reference ids
pub mod batch;

/// Transactional sink interface
pub mod sink;

/// Signature verification types and provider interface
pub mod verification;

/// Commit resolution step
pub mod resolver;

/// Signature enrichment step
pub mod enricher;

/// Per-event orchestration of both steps
pub mod handler;

/// Sink implementations
pub mod adapters;

// Re-export key types for convenience
pub use adapters::{InMemorySink, JsonLinesSink};
pub use batch::{BatchError, BatchScope, EntityBatch, LocalRef, ScopeId};
pub use enricher::{EnrichmentError, SignatureEnricher};
pub use entities::{
    Entity, GitCommitEntity, GitCommitSignatureEntity, GitRepoEntity, SignatureStatus,
};
pub use event::{CommitEvent, EventError, RepoCoordinates};
pub use handler::{CommitSignatureHandler, EventContext, HandlerError, HandlerOutcome};
pub use resolver::{CommitResolver, Resolution, ResolutionError, ResolvedCommit};
pub use sink::{EntitySink, SinkError};
pub use verification::{
    CommitVerification, CommitVerificationProvider, ProviderError, VerificationOutcome,
    VerificationReason,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
