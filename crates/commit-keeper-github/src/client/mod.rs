//! GitHub API client.
//!
//! A thin wrapper over `reqwest` that knows how to address github.com and
//! GitHub Enterprise installations and how to map HTTP failures onto
//! [`ApiError`].

mod commits;

use std::time::Duration;

use commit_keeper_core::ProviderUrl;
use reqwest::header::{ACCEPT, AUTHORIZATION};

use crate::error::ApiError;

pub use commits::{CommitDetail, CommitResponse, Verification};

/// Public GitHub API endpoint
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// REST API version requested on every call
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Configuration for GitHub API client behavior.
///
/// # Examples
///
/// ```
/// use commit_keeper_github::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_github_api_url("https://ghe.example.com/api/v3");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests (required by GitHub)
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// API base URL; derived from the event's provider URL when `None`
    pub github_api_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("commit-keeper/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            github_api_url: None,
        }
    }
}

impl ClientConfig {
    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the GitHub API base URL.
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = Some(url.into());
        self
    }
}

/// Derive the REST API base URL for a provider.
///
/// `github.com` maps to the public API; any other host is treated as a
/// GitHub Enterprise server serving its API under `/api/v3`.
pub fn api_base_url(provider_url: &ProviderUrl) -> String {
    match provider_url.host().as_deref() {
        Some("github.com") | Some("www.github.com") => GITHUB_API_URL.to_string(),
        _ => format!("{}/api/v3", provider_url.as_str().trim_end_matches('/')),
    }
}

/// GitHub REST client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl GitHubClient {
    /// Create a new builder for constructing a GitHub client.
    pub fn builder() -> GitHubClientBuilder {
        GitHubClientBuilder::new()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API base URL used for repositories hosted at `provider_url`
    pub fn api_url_for(&self, provider_url: &ProviderUrl) -> String {
        match &self.config.github_api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => api_base_url(provider_url),
        }
    }

    /// Issue a GET against `url`, authenticating with `token` when it is non-empty.
    ///
    /// Non-success statuses are mapped onto `ApiError`:
    /// 401 → `AuthenticationFailed`, 403 → `AuthorizationFailed`,
    /// 404 and 422 → `NotFound`, anything else → `HttpError` with the body.
    pub(crate) async fn get(&self, url: &str, token: &str) -> Result<reqwest::Response, ApiError> {
        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);

        if !token.trim().is_empty() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::HttpClientError(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                404 | 422 => ApiError::NotFound,
                403 => ApiError::AuthorizationFailed,
                401 => ApiError::AuthenticationFailed,
                _ => {
                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read error body".to_string());
                    ApiError::HttpError {
                        status: status.as_u16(),
                        message,
                    }
                }
            });
        }

        Ok(response)
    }
}

/// Builder for [`GitHubClient`].
#[derive(Debug, Default)]
pub struct GitHubClientBuilder {
    config: Option<ClientConfig>,
}

impl GitHubClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client configuration.
    ///
    /// If not set, uses `ClientConfig::default()`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the GitHub client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the HTTP client cannot be created.
    pub fn build(self) -> Result<GitHubClient, ApiError> {
        let config = self.config.unwrap_or_default();

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(GitHubClient {
            http_client,
            config,
        })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
