//! End-to-end tests for the commit signature flow: event decoding, repo and
//! commit resolution, GitHub verification lookup and signature submission.

mod common;

use common::*;
use commit_keeper_core::{
    EnrichmentError, Entity, EventContext, HandlerError, InMemorySink, JsonLinesSink,
    ProviderError, ResolutionError, SignatureStatus, SinkError, VerificationOutcome,
    VerificationReason,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Successful flows
// ============================================================================

/// Verify the sample event produces repo, commit and signature entities.
#[tokio::test]
async fn test_signed_commit_produces_three_entities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(commit_path()))
        .and(header("Authorization", format!("Bearer {}", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": SHA,
            "commit": {
                "verification": {
                    "verified": true,
                    "reason": "valid",
                    "signature": "-----BEGIN PGP SIGNATURE-----\nwsBcBAABCAAQBQ\n-----END PGP SIGNATURE-----"
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sink = InMemorySink::new();
    let handler = handler_for(&server, Arc::new(sink.clone()));

    let outcome = assert_ok!(
        handler
            .handle(&EventContext::new(), &event_body(&sample_event()))
            .await
    );

    assert_eq!(outcome.repository, "atomist-skills/go-sample-skill");
    assert_eq!(outcome.reason, VerificationReason::Valid);
    assert_eq!(outcome.outcome, VerificationOutcome::Valid);
    assert_eq!(outcome.entities_submitted, 3);

    let batches = sink.batches().await;
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[1].len(), 1);

    let entities = sink.entities().await;
    let (repo, commit, signature) = match entities.as_slice() {
        [Entity::Repo(r), Entity::Commit(c), Entity::CommitSignature(s)] => (r, c, s),
        other => panic!("unexpected entity sequence: {:?}", other),
    };

    assert_eq!(repo.source_id.as_str(), "123456");
    assert_eq!(repo.url.as_str(), "https://github.com/");
    assert_eq!(commit.sha.as_str(), SHA);
    assert_eq!(commit.repo, repo.entity);
    assert_eq!(commit.url.as_str(), "https://github.com/");
    assert_eq!(signature.commit, commit.entity);
    assert_eq!(signature.reason, VerificationReason::Valid);
    assert_eq!(signature.status, SignatureStatus::Verified);
    assert!(!signature.signature.is_empty());
}

/// Verify an unsigned commit records an empty signature with the absent outcome.
#[tokio::test]
async fn test_unsigned_commit_is_absent() {
    let server = MockServer::start().await;
    mount_commit(
        &server,
        serde_json::json!({ "verified": false, "reason": "unsigned", "signature": null }),
        1,
    )
    .await;

    let sink = InMemorySink::new();
    let handler = handler_for(&server, Arc::new(sink.clone()));

    let outcome = handler
        .handle(&EventContext::new(), &event_body(&sample_event()))
        .await
        .unwrap();

    assert_eq!(outcome.outcome, VerificationOutcome::Absent);

    match sink.entities().await.last() {
        Some(Entity::CommitSignature(signature)) => {
            assert!(signature.signature.is_empty());
            assert_eq!(signature.reason, VerificationReason::Unsigned);
            assert_eq!(signature.status, SignatureStatus::NotVerified);
        }
        other => panic!("expected signature entity, got {:?}", other),
    }
}

/// Verify a bad signature is recorded, not treated as a failure.
#[tokio::test]
async fn test_unverified_signature_is_recorded() {
    let server = MockServer::start().await;
    mount_commit(
        &server,
        serde_json::json!({ "verified": false, "reason": "bad_email", "signature": "sig" }),
        1,
    )
    .await;

    let sink = InMemorySink::new();
    let handler = handler_for(&server, Arc::new(sink.clone()));

    let outcome = handler
        .handle(&EventContext::new(), &event_body(&sample_event()))
        .await
        .unwrap();

    assert_eq!(outcome.reason, VerificationReason::BadEmail);
    assert_ne!(outcome.outcome, VerificationOutcome::Valid);
    assert_eq!(sink.entities().await.len(), 3);
}

/// Verify repeated runs submit identical entity sequences apart from scope ids.
#[tokio::test]
async fn test_submission_order_is_deterministic() {
    let server = MockServer::start().await;
    mount_commit(
        &server,
        serde_json::json!({ "verified": true, "reason": "valid", "signature": "sig" }),
        3,
    )
    .await;

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let sink = InMemorySink::new();
        let handler = handler_for(&server, Arc::new(sink.clone()));
        handler
            .handle(&EventContext::new(), &event_body(&sample_event()))
            .await
            .unwrap();

        let run: Vec<&'static str> = sink
            .entities()
            .await
            .iter()
            .map(|e| e.entity_type())
            .collect();
        kinds.push(run);
    }

    assert_eq!(kinds[0], vec!["git/repo", "git/commit", "git.commit/signature"]);
    assert!(kinds.windows(2).all(|w| w[0] == w[1]));
}

// ============================================================================
// Failure flows
// ============================================================================

/// Verify the provider is never called when the first batch is rejected.
#[tokio::test]
async fn test_sink_failure_skips_enrichment() {
    let server = MockServer::start().await;
    mount_commit(
        &server,
        serde_json::json!({ "verified": true, "reason": "valid", "signature": "sig" }),
        0,
    )
    .await;

    let sink = InMemorySink::rejecting("store offline");
    let handler = handler_for(&server, Arc::new(sink.clone()));

    let err = handler
        .handle(&EventContext::new(), &event_body(&sample_event()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Resolution(ResolutionError::Sink(SinkError::Rejected { .. }))
    ));
    assert!(sink.entities().await.is_empty());
}

/// Verify an incomplete event fails before any sink or provider call.
#[tokio::test]
async fn test_incomplete_event_fails_resolution() {
    let server = MockServer::start().await;
    mount_commit(
        &server,
        serde_json::json!({ "verified": true, "reason": "valid", "signature": "sig" }),
        0,
    )
    .await;

    let mut event = sample_event();
    event["git.commit/repo"]["git.repo/source-id"] = serde_json::Value::Null;

    let sink = InMemorySink::new();
    let handler = handler_for(&server, Arc::new(sink.clone()));

    let err = handler
        .handle(&EventContext::new(), &event_body(&event))
        .await
        .unwrap_err();

    match err {
        HandlerError::Resolution(ResolutionError::MissingField { field }) => {
            assert_eq!(field, "git.repo/source-id")
        }
        other => panic!("expected missing field, got {:?}", other),
    }
    assert_eq!(sink.attempts().await, 0);
}

/// Verify a missing commit fails enrichment with no signature submission.
#[tokio::test]
async fn test_commit_not_found_fails_enrichment() {
    let server = MockServer::start().await;
    mount_commit_status(&server, 404).await;

    let sink = InMemorySink::new();
    let handler = handler_for(&server, Arc::new(sink.clone()));

    let err = handler
        .handle(&EventContext::new(), &event_body(&sample_event()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Enrichment(EnrichmentError::Provider(ProviderError::NotFound { .. }))
    ));
    assert!(!err.is_transient());
    assert_eq!(sink.batches().await.len(), 1);
}

/// Verify provider outages are reported as transient.
#[tokio::test]
async fn test_provider_outage_is_transient() {
    let server = MockServer::start().await;
    mount_commit_status(&server, 503).await;

    let sink = InMemorySink::new();
    let handler = handler_for(&server, Arc::new(sink.clone()));

    let err = handler
        .handle(&EventContext::new(), &event_body(&sample_event()))
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

/// Verify a slow provider is abandoned once the deadline elapses.
#[tokio::test]
async fn test_deadline_cancels_slow_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(commit_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "sha": SHA, "commit": {} }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let sink = InMemorySink::new();
    let handler = handler_for(&server, Arc::new(sink.clone()));
    let ctx = EventContext::new().with_timeout(Duration::from_millis(200));

    let err = handler
        .handle(&ctx, &event_body(&sample_event()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Enrichment(EnrichmentError::Cancelled)
    ));
    assert_eq!(sink.batches().await.len(), 1);
}

/// Verify concurrent events never share local reference scopes.
#[tokio::test]
async fn test_concurrent_events_use_distinct_scopes() {
    let server = MockServer::start().await;
    mount_commit(
        &server,
        serde_json::json!({ "verified": true, "reason": "valid", "signature": "sig" }),
        2,
    )
    .await;

    let sink = InMemorySink::new();
    let handler = Arc::new(handler_for(&server, Arc::new(sink.clone())));
    let body = event_body(&sample_event());

    let (first_ctx, second_ctx) = (EventContext::new(), EventContext::new());
    let (first, second) = tokio::join!(
        handler.handle(&first_ctx, &body),
        handler.handle(&second_ctx, &body)
    );

    assert_ok!(first);
    assert_ok!(second);

    let commits: Vec<_> = sink
        .entities()
        .await
        .into_iter()
        .filter_map(|e| match e {
            Entity::Commit(c) => Some(c),
            _ => None,
        })
        .collect();

    assert_eq!(commits.len(), 2);
    assert_ne!(commits[0].entity.scope(), commits[1].entity.scope());
}

// ============================================================================
// JSON-lines sink
// ============================================================================

/// Verify the file sink receives one line per batch.
#[tokio::test]
async fn test_jsonl_sink_end_to_end() {
    let server = MockServer::start().await;
    mount_commit(
        &server,
        serde_json::json!({ "verified": true, "reason": "valid", "signature": "sig" }),
        1,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("entities.jsonl");
    let sink = JsonLinesSink::open(&output).await.unwrap();
    let handler = handler_for(&server, Arc::new(sink));

    handler
        .handle(&EventContext::new(), &event_body(&sample_event()))
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0][0]["schema/entity-type"], "git/repo");
    assert_eq!(lines[0][0]["schema/entity"], "$repo");
    assert_eq!(lines[0][1]["git.commit/repo"], "$repo");
    assert_eq!(lines[1][0]["schema/entity-type"], "git.commit/signature");
    assert_eq!(lines[1][0]["git.commit.signature/commit"], "$commit");
}
