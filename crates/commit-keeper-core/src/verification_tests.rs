//! Tests for verification normalization and reason mapping.

use super::*;

#[test]
fn test_reason_outcome_mapping() {
    assert_eq!(VerificationReason::Valid.outcome(), VerificationOutcome::Valid);
    assert_eq!(VerificationReason::Unsigned.outcome(), VerificationOutcome::Absent);

    for reason in [
        VerificationReason::Invalid,
        VerificationReason::MalformedSignature,
        VerificationReason::BadEmail,
        VerificationReason::UnverifiedEmail,
        VerificationReason::NoUser,
        VerificationReason::NotSigningKey,
        VerificationReason::ExpiredKey,
        VerificationReason::BadCert,
        VerificationReason::OcspRevoked,
    ] {
        assert_eq!(reason.outcome(), VerificationOutcome::Invalid, "{}", reason);
    }

    for reason in [
        VerificationReason::GpgverifyError,
        VerificationReason::GpgverifyUnavailable,
        VerificationReason::UnknownSignatureType,
        VerificationReason::UnknownKey,
        VerificationReason::OcspPending,
        VerificationReason::OcspError,
        VerificationReason::Unknown,
    ] {
        assert_eq!(
            reason.outcome(),
            VerificationOutcome::Unverifiable,
            "{}",
            reason
        );
    }
}

#[test]
fn test_reason_parse_matches_wire_form() {
    for reason in [
        VerificationReason::Valid,
        VerificationReason::Unsigned,
        VerificationReason::ExpiredKey,
        VerificationReason::OcspRevoked,
    ] {
        assert_eq!(VerificationReason::parse(reason.as_str()), reason);
        assert_eq!(
            serde_json::to_value(reason).unwrap(),
            serde_json::Value::String(reason.as_str().to_string())
        );
    }

    assert_eq!(VerificationReason::parse(" VALID "), VerificationReason::Valid);
    assert_eq!(
        VerificationReason::parse("something_new"),
        VerificationReason::Unknown
    );
    assert_eq!(
        serde_json::from_str::<VerificationReason>("\"something_new\"").unwrap(),
        VerificationReason::Unknown
    );
}

#[test]
fn test_valid_signature() {
    let v = CommitVerification::from_provider(true, Some("valid"), Some("sig".to_string()));

    assert!(v.verified);
    assert_eq!(v.reason, VerificationReason::Valid);
    assert_eq!(v.signature.as_deref(), Some("sig"));
    assert_eq!(v.outcome(), VerificationOutcome::Valid);
}

#[test]
fn test_missing_signature_is_absent_whatever_the_provider_says() {
    for (verified, reason, signature) in [
        (false, Some("unsigned"), None),
        (true, Some("valid"), None),
        (false, Some("invalid"), Some("   ".to_string())),
        (false, None, None),
    ] {
        let v = CommitVerification::from_provider(verified, reason, signature);
        assert_eq!(v, CommitVerification::unsigned());
        assert_eq!(v.outcome(), VerificationOutcome::Absent);
    }
}

#[test]
fn test_signed_commit_without_reason_is_unverifiable() {
    for reason in [None, Some(""), Some("unsigned")] {
        let v = CommitVerification::from_provider(false, reason, Some("sig".to_string()));
        assert_eq!(v.reason, VerificationReason::Unknown);
        assert_eq!(v.outcome(), VerificationOutcome::Unverifiable);
        assert!(!v.verified);
    }
}

#[test]
fn test_inconsistent_verified_flag() {
    let v = CommitVerification::from_provider(false, Some("valid"), Some("sig".to_string()));
    assert_eq!(v.reason, VerificationReason::Unknown);
    assert!(!v.verified);

    let v = CommitVerification::from_provider(true, Some("bad_email"), Some("sig".to_string()));
    assert_eq!(v.reason, VerificationReason::BadEmail);
    assert!(!v.verified);
}

#[test]
fn test_provider_error_classification() {
    let network = ProviderError::Network {
        message: "connection reset".to_string(),
    };
    assert!(network.is_transient());
    assert_eq!(network.error_category(), ErrorCategory::Transient);

    let server = ProviderError::HttpError {
        status: 502,
        message: "bad gateway".to_string(),
    };
    assert!(server.is_transient());

    let auth = ProviderError::AuthenticationFailed {
        message: "bad token".to_string(),
    };
    assert!(!auth.is_transient());
    assert_eq!(auth.error_category(), ErrorCategory::Configuration);

    let missing = ProviderError::NotFound {
        resource: "commit".to_string(),
    };
    assert_eq!(missing.error_category(), ErrorCategory::Permanent);
}
