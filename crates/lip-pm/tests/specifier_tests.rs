//! Integration tests for tooth specifier parsing

use lip_pm::{Specifier, SpecifierError, SpecifierKind, Version};

#[test]
fn test_archive_specifier() {
    let spec: Specifier = "downloads/LLBDS3-1.0.0.tth".parse().unwrap();
    assert_eq!(spec.kind(), SpecifierKind::ToothArchive);
    assert_eq!(spec.archive_path().unwrap(), "downloads/LLBDS3-1.0.0.tth");
    assert!(!spec.is_version_specified());
}

#[test]
fn test_repo_specifier_with_version() {
    let spec = Specifier::parse("github.com/tooth-hub/llbds3@1.0.0").unwrap();
    assert_eq!(spec.kind(), SpecifierKind::ToothRepo);
    assert!(spec.is_version_specified());
    assert_eq!(spec.repo().unwrap(), "github.com/tooth-hub/llbds3");
    assert_eq!(spec.version().unwrap(), &Version::new(1, 0, 0));
}

#[test]
fn test_display_round_trip() {
    for s in [
        "github.com/tooth-hub/llbds3@1.0.0",
        "github.com/tooth-hub/llbds3@2.0.0-rc.1",
        "github.com/tooth-hub/llbds3",
        "my archive.tth",
    ] {
        let spec = Specifier::parse(s).unwrap();
        assert_eq!(spec.to_string(), s);
        assert_eq!(Specifier::parse(&spec.to_string()).unwrap(), spec);
    }
}

#[test]
fn test_repo_is_lower_cased() {
    let spec = Specifier::parse("GitHub.com/Tooth-Hub/LLBDS3@1.0.0").unwrap();
    assert_eq!(spec.to_string(), "github.com/tooth-hub/llbds3@1.0.0");
}

#[test]
fn test_invalid_specifier() {
    assert!(matches!(
        Specifier::parse("not a valid spec!"),
        Err(SpecifierError::InvalidSpecifier(_))
    ));
    assert!(matches!(
        Specifier::parse("github.com/tooth-hub/llbds3@latest"),
        Err(SpecifierError::InvalidSpecifier(_))
    ));
}

#[test]
fn test_accessor_errors() {
    let unversioned = Specifier::parse("github.com/tooth-hub/llbds3").unwrap();
    assert!(matches!(
        unversioned.version(),
        Err(SpecifierError::VersionNotSpecified(_))
    ));

    let archive = Specifier::parse("a.tth").unwrap();
    let err = archive.repo().unwrap_err();
    assert_eq!(err.to_string(), "Specifier is not a tooth repo: a.tth");
}
