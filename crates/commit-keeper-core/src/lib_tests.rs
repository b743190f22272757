//! Tests for the commit-keeper-core library module.

use super::*;

#[test]
fn test_commit_sha_validation() {
    let sha = CommitSha::new("D2C6724307F007755FC770944FD7BC5FF55933B0").unwrap();
    assert_eq!(sha.as_str(), "d2c6724307f007755fc770944fd7bc5ff55933b0");
    assert_eq!(sha.short(), "d2c6724");

    assert!(matches!(
        CommitSha::new(""),
        Err(ValidationError::Required { .. })
    ));
    assert!(matches!(
        CommitSha::new("abc"),
        Err(ValidationError::TooShort { .. })
    ));
    assert!(matches!(
        CommitSha::new("a".repeat(65)),
        Err(ValidationError::TooLong { .. })
    ));
    assert!(matches!(
        CommitSha::new("not-a-sha"),
        Err(ValidationError::InvalidCharacters { .. })
    ));
}

#[test]
fn test_source_id_rejects_blank() {
    assert!(SourceId::new("123456").is_ok());
    assert!(matches!(
        SourceId::new("   "),
        Err(ValidationError::Required { .. })
    ));
}

#[test]
fn test_provider_url_preserves_original_text() {
    let url = ProviderUrl::new("https://github.com/").unwrap();
    assert_eq!(url.as_str(), "https://github.com/");
    assert_eq!(url.host().as_deref(), Some("github.com"));

    let ghe = ProviderUrl::new("https://GHE.example.com").unwrap();
    assert_eq!(ghe.host().as_deref(), Some("ghe.example.com"));
}

#[test]
fn test_provider_url_validation() {
    assert!(matches!(
        ProviderUrl::new(""),
        Err(ValidationError::Required { .. })
    ));
    assert!(matches!(
        ProviderUrl::new("github.com"),
        Err(ValidationError::InvalidFormat { .. })
    ));
    assert!(matches!(
        ProviderUrl::new("ftp://github.com/"),
        Err(ValidationError::InvalidFormat { .. })
    ));
}

#[test]
fn test_credential_is_redacted() {
    let credential = InstallationCredential::new("ghs_secret_value");
    assert_eq!(format!("{}", credential), "<redacted>");
    assert!(!format!("{:?}", credential).contains("ghs_secret_value"));
    assert_eq!(credential.expose(), "ghs_secret_value");

    let anonymous = InstallationCredential::anonymous();
    assert!(anonymous.is_empty());
    assert_eq!(format!("{}", anonymous), "<none>");
}

#[test]
fn test_correlation_id_round_trips_through_string() {
    let id = CorrelationId::new();
    let parsed: CorrelationId = id.as_str().parse().unwrap();
    assert_eq!(id, parsed);

    assert!("not-a-uuid".parse::<CorrelationId>().is_err());
}

#[test]
fn test_validation_error_field() {
    let err = ValidationError::TooLong {
        field: "sha".to_string(),
        max_length: 64,
    };
    assert_eq!(err.field(), "sha");
}
