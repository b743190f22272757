//! # Commit Event Module
//!
//! Decodes the inbound "commit pushed" notification into a normalized
//! [`CommitEvent`].
//!
//! The transport delivers the subscription result as a JSON document keyed by
//! namespaced attribute names (`git.commit/sha`, `git.repo/name`, ...). The
//! wire structs in this module mirror that shape exactly and are private to
//! the decoding step; everything downstream works with [`CommitEvent`].

use crate::{CommitSha, InstallationCredential, ProviderUrl, SourceId, ValidationError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Wire format
// ============================================================================

/// Subscription result for a pushed commit, as delivered by the transport
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitPushedPayload {
    #[serde(rename = "git.commit/sha", default)]
    pub sha: Option<String>,

    #[serde(rename = "git.commit/repo", default)]
    pub repo: Option<RepoPayload>,
}

/// Repository section of [`CommitPushedPayload`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoPayload {
    #[serde(rename = "git.repo/name", default)]
    pub name: Option<String>,

    #[serde(rename = "git.repo/default-branch", default)]
    pub default_branch: Option<String>,

    #[serde(rename = "git.repo/org", default)]
    pub org: Option<OrgPayload>,

    #[serde(
        rename = "git.repo/source-id",
        default,
        deserialize_with = "string_or_number"
    )]
    pub source_id: Option<String>,
}

/// Organization section of [`RepoPayload`]
#[derive(Clone, Default, Deserialize)]
pub struct OrgPayload {
    #[serde(rename = "git.org/name", default)]
    pub name: Option<String>,

    #[serde(rename = "github.org/installation-token", default)]
    pub installation_token: Option<String>,

    #[serde(rename = "git.provider/url", default)]
    pub url: Option<String>,
}

impl std::fmt::Debug for OrgPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgPayload")
            .field("name", &self.name)
            .field(
                "installation_token",
                &self.installation_token.as_ref().map(|_| "<redacted>"),
            )
            .field("url", &self.url)
            .finish()
    }
}

/// Source ids arrive as strings from some providers and as integers from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number for source id, got {}",
            other
        ))),
    }
}

// ============================================================================
// Normalized event
// ============================================================================

/// Coordinates that identify a repository at a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoCoordinates {
    /// Owning organization (or user) name
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Provider base URL the repository lives at
    pub provider_url: ProviderUrl,
}

impl RepoCoordinates {
    /// `owner/name` form used in logs and API paths
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Normalized "commit pushed" event.
///
/// All required fields are validated at construction, so downstream steps
/// never have to deal with missing values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitEvent {
    pub sha: CommitSha,
    pub repo: RepoCoordinates,
    pub default_branch: Option<String>,
    pub source_id: SourceId,
    #[serde(serialize_with = "redact_credential")]
    pub credential: InstallationCredential,
}

fn redact_credential<S>(credential: &InstallationCredential, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&credential.to_string())
}

impl CommitEvent {
    /// Decode and normalize a raw JSON event body
    ///
    /// # Errors
    ///
    /// Returns `EventError` if:
    /// - The body is not valid JSON for the payload shape
    /// - A required field is missing or blank
    /// - A field value fails validation (e.g. non-hex SHA)
    pub fn decode(body: &[u8]) -> Result<Self, EventError> {
        let payload: CommitPushedPayload = serde_json::from_slice(body)?;
        Self::from_payload(payload)
    }

    /// Normalize an already-deserialized payload
    pub fn from_payload(payload: CommitPushedPayload) -> Result<Self, EventError> {
        let sha = required(payload.sha, "git.commit/sha")?;
        let repo = payload.repo.ok_or_else(|| EventError::MissingField {
            field: "git.commit/repo".to_string(),
        })?;

        let name = required(repo.name, "git.repo/name")?;
        let source_id = required(repo.source_id, "git.repo/source-id")?;
        let org = repo.org.ok_or_else(|| EventError::MissingField {
            field: "git.repo/org".to_string(),
        })?;
        let owner = required(org.name, "git.org/name")?;
        let provider_url = required(org.url, "git.provider/url")?;

        let default_branch = repo.default_branch.filter(|b| !b.trim().is_empty());
        let credential = org
            .installation_token
            .map(InstallationCredential::new)
            .unwrap_or_default();

        Ok(Self {
            sha: CommitSha::new(sha)?,
            repo: RepoCoordinates {
                owner,
                name,
                provider_url: ProviderUrl::new(provider_url)?,
            },
            default_branch,
            source_id: SourceId::new(source_id)?,
            credential,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, EventError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(EventError::MissingField {
            field: field.to_string(),
        }),
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors while decoding an inbound event
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field value: {0}")]
    InvalidField(#[from] ValidationError),
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
