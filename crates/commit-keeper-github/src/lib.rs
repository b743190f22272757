//! # Commit-Keeper GitHub Adapter
//!
//! GitHub REST implementation of
//! [`CommitVerificationProvider`](commit_keeper_core::CommitVerificationProvider).
//!
//! The client reads `commit.verification` from
//! `GET /repos/{owner}/{repo}/commits/{sha}` and normalizes it into a
//! [`CommitVerification`](commit_keeper_core::CommitVerification). Calls are
//! authenticated with the installation token carried on the inbound event;
//! an empty token results in an anonymous request.
//!
//! # Examples
//!
//! ```rust
//! use commit_keeper_github::{ClientConfig, GitHubClient};
//! use std::time::Duration;
//!
//! let client = GitHubClient::builder()
//!     .config(ClientConfig::default().with_timeout(Duration::from_secs(10)))
//!     .build()
//!     .unwrap();
//! assert_eq!(client.config().timeout, Duration::from_secs(10));
//! ```

pub mod client;
pub mod error;

pub use client::{
    api_base_url, ClientConfig, CommitDetail, CommitResponse, GitHubClient, GitHubClientBuilder,
    Verification,
};
pub use error::ApiError;
