//! Commit operations.
//!
//! Fetches a single commit and exposes its signature verification through
//! the [`CommitVerificationProvider`] port.

use async_trait::async_trait;
use commit_keeper_core::{
    CommitSha, CommitVerification, CommitVerificationProvider, InstallationCredential,
    ProviderError, ProviderUrl, RepoCoordinates,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::client::GitHubClient;
use crate::error::ApiError;

/// Subset of the "get a commit" response this crate reads
#[derive(Debug, Clone, Deserialize)]
pub struct CommitResponse {
    pub sha: String,
    pub commit: CommitDetail,
}

/// Git-level commit data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub verification: Option<Verification>,
}

/// Signature verification block of a commit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Verification {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}

impl From<Verification> for CommitVerification {
    fn from(v: Verification) -> Self {
        CommitVerification::from_provider(v.verified, v.reason.as_deref(), v.signature)
    }
}

impl GitHubClient {
    /// Get a single commit.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` - Commit or repository does not exist or is not visible
    /// * `ApiError::AuthenticationFailed` - Token rejected
    /// * `ApiError::AuthorizationFailed` - Insufficient permissions
    /// * `ApiError::JsonError` - Response body could not be parsed
    pub async fn get_commit(
        &self,
        provider_url: &ProviderUrl,
        owner: &str,
        repo: &str,
        sha: &str,
        token: &str,
    ) -> Result<CommitResponse, ApiError> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url_for(provider_url),
            owner,
            repo,
            sha
        );

        let response = self.get(&url, token).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CommitVerificationProvider for GitHubClient {
    #[instrument(skip(self, repo, credential, sha), fields(
        repository = %repo.full_name(),
        sha = %sha.short(),
        authenticated = !credential.is_empty(),
    ))]
    async fn commit_verification(
        &self,
        repo: &RepoCoordinates,
        credential: &InstallationCredential,
        sha: &CommitSha,
    ) -> Result<CommitVerification, ProviderError> {
        let commit = self
            .get_commit(
                &repo.provider_url,
                &repo.owner,
                &repo.name,
                sha.as_str(),
                credential.expose(),
            )
            .await
            .map_err(|e| match e {
                ApiError::NotFound => ProviderError::NotFound {
                    resource: format!("commit {} in {}", sha, repo.full_name()),
                },
                other => ProviderError::from(other),
            })?;

        let verification = commit
            .commit
            .verification
            .map(CommitVerification::from)
            .unwrap_or_else(CommitVerification::unsigned);

        debug!(
            verified = verification.verified,
            reason = %verification.reason,
            "Fetched commit verification"
        );

        Ok(verification)
    }
}

#[cfg(test)]
#[path = "commits_tests.rs"]
mod tests;
