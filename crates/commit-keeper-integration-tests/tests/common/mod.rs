//! Common test utilities for commit-keeper integration tests
//!
//! This module provides:
//! - Event fixtures in the inbound wire shape
//! - A mock GitHub API backed by wiremock
//! - Handler construction over a chosen sink

use commit_keeper_core::{CommitSignatureHandler, EntitySink};
use commit_keeper_github::{ClientConfig, GitHubClient};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SHA: &str = "d2c6724307f007755fc770944fd7bc5ff55933b0";
pub const TOKEN: &str = "ghs_installation_token";

// ============================================================================
// Event fixtures
// ============================================================================

/// The sample "commit pushed" event for atomist-skills/go-sample-skill
pub fn sample_event() -> serde_json::Value {
    serde_json::json!({
        "git.commit/sha": SHA,
        "git.commit/repo": {
            "git.repo/name": "go-sample-skill",
            "git.repo/default-branch": "main",
            "git.repo/source-id": "123456",
            "git.repo/org": {
                "git.org/name": "atomist-skills",
                "github.org/installation-token": TOKEN,
                "git.provider/url": "https://github.com/"
            }
        }
    })
}

pub fn event_body(value: &serde_json::Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

// ============================================================================
// Mock GitHub API
// ============================================================================

pub fn commit_path() -> String {
    format!("/repos/atomist-skills/go-sample-skill/commits/{}", SHA)
}

/// Mount a commit response carrying the given verification block
#[allow(dead_code)]
pub async fn mount_commit(server: &MockServer, verification: serde_json::Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(commit_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": SHA,
            "commit": {
                "message": "Add sample skill",
                "verification": verification
            }
        })))
        .expect(expected)
        .mount(server)
        .await;
}

/// Mount a failing commit lookup
#[allow(dead_code)]
pub async fn mount_commit_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(commit_path()))
        .respond_with(ResponseTemplate::new(status).set_body_string("{}"))
        .mount(server)
        .await;
}

/// Handler wired to the mock server and the given sink
pub fn handler_for(server: &MockServer, sink: Arc<dyn EntitySink>) -> CommitSignatureHandler {
    let client = GitHubClient::builder()
        .config(ClientConfig::default().with_github_api_url(server.uri()))
        .build()
        .unwrap();

    CommitSignatureHandler::new(sink, Arc::new(client))
}
