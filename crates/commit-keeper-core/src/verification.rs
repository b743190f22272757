//! # Signature Verification
//!
//! Provider-neutral view of a commit's signature verification, plus the
//! [`CommitVerificationProvider`] port the enricher calls.
//!
//! Providers report a fine-grained reason code. Every code maps onto one of
//! four [`VerificationOutcome`]s:
//!
//! | Outcome | Reasons |
//! |---|---|
//! | valid | `valid` |
//! | absent | `unsigned` |
//! | invalid | `invalid`, `malformed_signature`, `bad_email`, `unverified_email`, `no_user`, `not_signing_key`, `expired_key`, `bad_cert`, `ocsp_revoked` |
//! | unverifiable | `gpgverify_error`, `gpgverify_unavailable`, `unknown_signature_type`, `unknown_key`, `ocsp_pending`, `ocsp_error`, anything unrecognized |

use crate::event::RepoCoordinates;
use crate::{CommitSha, ErrorCategory, InstallationCredential};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Reasons and outcomes
// ============================================================================

/// Coarse result of signature verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Signed and the signature checks out
    Valid,
    /// Signed but the signature does not check out
    Invalid,
    /// No signature on the commit
    Absent,
    /// Signed, but the provider could not decide
    Unverifiable,
}

/// Provider reason code for a verification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationReason {
    Valid,
    Unsigned,
    Invalid,
    ExpiredKey,
    NotSigningKey,
    GpgverifyError,
    GpgverifyUnavailable,
    UnknownSignatureType,
    NoUser,
    UnverifiedEmail,
    BadEmail,
    UnknownKey,
    MalformedSignature,
    BadCert,
    OcspPending,
    OcspError,
    OcspRevoked,
    #[serde(other)]
    Unknown,
}

impl VerificationReason {
    /// Wire form of the reason
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Unsigned => "unsigned",
            Self::Invalid => "invalid",
            Self::ExpiredKey => "expired_key",
            Self::NotSigningKey => "not_signing_key",
            Self::GpgverifyError => "gpgverify_error",
            Self::GpgverifyUnavailable => "gpgverify_unavailable",
            Self::UnknownSignatureType => "unknown_signature_type",
            Self::NoUser => "no_user",
            Self::UnverifiedEmail => "unverified_email",
            Self::BadEmail => "bad_email",
            Self::UnknownKey => "unknown_key",
            Self::MalformedSignature => "malformed_signature",
            Self::BadCert => "bad_cert",
            Self::OcspPending => "ocsp_pending",
            Self::OcspError => "ocsp_error",
            Self::OcspRevoked => "ocsp_revoked",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a provider reason code, mapping unrecognized codes to `Unknown`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "valid" => Self::Valid,
            "unsigned" => Self::Unsigned,
            "invalid" => Self::Invalid,
            "expired_key" => Self::ExpiredKey,
            "not_signing_key" => Self::NotSigningKey,
            "gpgverify_error" => Self::GpgverifyError,
            "gpgverify_unavailable" => Self::GpgverifyUnavailable,
            "unknown_signature_type" => Self::UnknownSignatureType,
            "no_user" => Self::NoUser,
            "unverified_email" => Self::UnverifiedEmail,
            "bad_email" => Self::BadEmail,
            "unknown_key" => Self::UnknownKey,
            "malformed_signature" => Self::MalformedSignature,
            "bad_cert" => Self::BadCert,
            "ocsp_pending" => Self::OcspPending,
            "ocsp_error" => Self::OcspError,
            "ocsp_revoked" => Self::OcspRevoked,
            _ => Self::Unknown,
        }
    }

    /// Outcome this reason maps onto
    pub fn outcome(&self) -> VerificationOutcome {
        match self {
            Self::Valid => VerificationOutcome::Valid,
            Self::Unsigned => VerificationOutcome::Absent,
            Self::Invalid
            | Self::MalformedSignature
            | Self::BadEmail
            | Self::UnverifiedEmail
            | Self::NoUser
            | Self::NotSigningKey
            | Self::ExpiredKey
            | Self::BadCert
            | Self::OcspRevoked => VerificationOutcome::Invalid,
            Self::GpgverifyError
            | Self::GpgverifyUnavailable
            | Self::UnknownSignatureType
            | Self::UnknownKey
            | Self::OcspPending
            | Self::OcspError
            | Self::Unknown => VerificationOutcome::Unverifiable,
        }
    }
}

impl fmt::Display for VerificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Normalized verification
// ============================================================================

/// Normalized verification of one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitVerification {
    /// Whether the provider considers the signature verified
    pub verified: bool,
    /// Reason code, consistent with `verified` and `signature`
    pub reason: VerificationReason,
    /// Signature payload, `None` when the commit is unsigned
    pub signature: Option<String>,
}

impl CommitVerification {
    /// Normalize the raw values a provider returned.
    ///
    /// The result always satisfies:
    /// - no signature implies reason `unsigned` and `verified == false`
    /// - a signature never carries reason `unsigned`; a missing, blank, or
    ///   `unsigned` reason on a signed commit becomes `unknown`
    /// - `verified` is true only with reason `valid`
    pub fn from_provider(verified: bool, reason: Option<&str>, signature: Option<String>) -> Self {
        let signature = signature.filter(|s| !s.trim().is_empty());

        if signature.is_none() {
            return Self::unsigned();
        }

        let reason = match reason.map(VerificationReason::parse) {
            None | Some(VerificationReason::Unsigned) => VerificationReason::Unknown,
            Some(VerificationReason::Valid) if !verified => VerificationReason::Unknown,
            Some(other) => other,
        };

        Self {
            verified: reason == VerificationReason::Valid,
            reason,
            signature,
        }
    }

    /// Verification of a commit with no signature
    pub fn unsigned() -> Self {
        Self {
            verified: false,
            reason: VerificationReason::Unsigned,
            signature: None,
        }
    }

    /// Coarse outcome
    pub fn outcome(&self) -> VerificationOutcome {
        self.reason.outcome()
    }
}

// ============================================================================
// Provider port
// ============================================================================

/// Source of signature verification data for commits
#[async_trait]
pub trait CommitVerificationProvider: Send + Sync {
    /// Fetch the verification of `sha` in `repo`.
    ///
    /// An empty `credential` means the call is made anonymously.
    async fn commit_verification(
        &self,
        repo: &RepoCoordinates,
        credential: &InstallationCredential,
        sha: &CommitSha,
    ) -> Result<CommitVerification, ProviderError>;
}

/// Errors from a verification provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Authorization failed: {message}")]
    AuthorizationFailed { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Provider client misconfigured: {message}")]
    Configuration { message: String },
}

impl ProviderError {
    /// Check if error is transient and the event may be re-delivered
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get error category for classification
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::AuthenticationFailed { .. }
            | Self::AuthorizationFailed { .. }
            | Self::Configuration { .. } => ErrorCategory::Configuration,
            _ if self.is_transient() => ErrorCategory::Transient,
            _ => ErrorCategory::Permanent,
        }
    }
}

#[cfg(test)]
#[path = "verification_tests.rs"]
mod tests;
