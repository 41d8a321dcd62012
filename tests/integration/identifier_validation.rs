//! Integration tests for font slug parsing and validation

use fontshare_downloader::identifier::{IdentifierError, ResourceIdentifier};

#[test]
fn test_identifier_parsing_simple_slug() {
    let id = ResourceIdentifier::parse("satoshi").unwrap();
    assert_eq!(id.as_str(), "satoshi");
    assert_eq!(id.to_string(), "satoshi");
}

#[test]
fn test_identifier_parsing_hyphenated_and_numeric() {
    assert!(ResourceIdentifier::parse("cabinet-grotesk").is_ok());
    assert!(ResourceIdentifier::parse("font-2024").is_ok());
    assert!(ResourceIdentifier::parse("a").is_ok());
}

#[test]
fn test_identifier_rejects_path_traversal() {
    for raw in ["../etc", "fonts/satoshi", "..", "sat\\oshi", "satoshi.zip"] {
        let err = ResourceIdentifier::parse(raw).unwrap_err();
        assert!(
            matches!(err, IdentifierError::InvalidCharacter { .. }),
            "{raw} should be rejected, got {err:?}"
        );
    }
}

#[test]
fn test_identifier_rejects_uppercase_and_whitespace() {
    let result = ResourceIdentifier::parse("Satoshi");
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("invalid character 'S'"));
    assert!(ResourceIdentifier::parse("clash display").is_err());
}

#[test]
fn test_identifier_rejects_boundary_hyphens() {
    assert!(matches!(
        ResourceIdentifier::parse("-satoshi"),
        Err(IdentifierError::InvalidBoundary(_))
    ));
    assert!(matches!(
        ResourceIdentifier::parse("satoshi-"),
        Err(IdentifierError::InvalidBoundary(_))
    ));
}

#[test]
fn test_identifier_empty_and_too_long() {
    assert_eq!(ResourceIdentifier::parse(""), Err(IdentifierError::Empty));
    let long = "a".repeat(101);
    assert_eq!(
        ResourceIdentifier::parse(&long),
        Err(IdentifierError::TooLong(101))
    );
}

#[test]
fn test_identifier_normalization_from_display_names() {
    assert_eq!(
        ResourceIdentifier::normalize("Clash Display").unwrap().as_str(),
        "clash-display"
    );
    assert_eq!(
        ResourceIdentifier::normalize("  General   Sans \n").unwrap().as_str(),
        "general-sans"
    );
    assert!(ResourceIdentifier::normalize("   ").is_err());
    assert!(ResourceIdentifier::normalize("Söhne").is_err());
}

#[test]
fn test_identifier_ordering_and_serde() {
    let mut ids: Vec<ResourceIdentifier> = ["zodiak", "author", "satoshi"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    ids.sort();
    let sorted: Vec<_> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(sorted, vec!["author", "satoshi", "zodiak"]);

    let json = serde_json::to_string(&ids).unwrap();
    assert_eq!(json, r#"["author","satoshi","zodiak"]"#);
    assert!(serde_json::from_str::<ResourceIdentifier>(r#""Bad Slug""#).is_err());
}
