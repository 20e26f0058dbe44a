//! Integration tests for version selection

use lip_pm::resolver::{
    latest_stable, parse_version_list, resolve_dependencies, resolve_specifier, select_version,
};
use lip_pm::{Manifest, Platform, Requirement, ResolverError, Specifier, Version};
use std::collections::HashMap;

const VERSION_LIST: &str = "\
v0.1.0
v0.2.0
v1.0.0-beta.1
v1.0.0
v1.0.1
v1.1.0
v2.0.0-rc.1+incompatible
";

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn test_version_list_parsing() {
    let versions = parse_version_list(VERSION_LIST);
    assert_eq!(versions.len(), 7);
    assert_eq!(versions.first(), Some(&v("0.1.0")));
    assert_eq!(versions.last(), Some(&v("2.0.0-rc.1")));
}

#[test]
fn test_empty_version_list() {
    assert!(parse_version_list("").is_empty());
    assert_eq!(latest_stable(&[]), None);
}

#[test]
fn test_selection() {
    let versions = parse_version_list(VERSION_LIST);

    let cases = [
        ("1.0.x", Some("1.0.1")),
        (">=1.0.0 <1.1.0", Some("1.0.1")),
        ("<1.0.0", Some("0.2.0")),
        ("<=1.0.0-beta.1", Some("1.0.0-beta.1")),
        ("0.1.x || 1.1.0", Some("1.1.0")),
        (">=2.0.0-rc.1", Some("2.0.0-rc.1")),
        ("3.0.x", None),
    ];
    for (expr, expected) in cases {
        let req = Requirement::parse(expr).unwrap();
        assert_eq!(
            select_version(&req, &versions),
            expected.map(v).as_ref(),
            "requirement {}",
            expr
        );
    }
}

#[test]
fn test_prerelease_selected_only_when_named() {
    let versions = parse_version_list(VERSION_LIST);

    let stable_range = Requirement::parse(">=1.0.0 <2.0.0").unwrap();
    assert_eq!(select_version(&stable_range, &versions), Some(&v("1.1.0")));

    let opted_in = Requirement::parse(">=1.0.0 <2.0.0 || >=2.0.0-rc.1 <2.0.0").unwrap();
    assert_eq!(select_version(&opted_in, &versions), Some(&v("2.0.0-rc.1")));
}

#[test]
fn test_specifier_resolution() {
    let versions = parse_version_list(VERSION_LIST);

    let latest = Specifier::parse("github.com/tooth-hub/bds").unwrap();
    assert_eq!(resolve_specifier(&latest, &versions).unwrap(), v("1.1.0"));

    let pinned = Specifier::parse("github.com/tooth-hub/bds@1.0.0-beta.1").unwrap();
    assert_eq!(
        resolve_specifier(&pinned, &versions).unwrap(),
        v("1.0.0-beta.1")
    );

    let prerelease_only = parse_version_list("v1.0.0-alpha\n");
    assert!(matches!(
        resolve_specifier(&latest, &prerelease_only),
        Err(ResolverError::NoStableVersion(_))
    ));
}

#[test]
fn test_manifest_dependencies_resolution() {
    let json = r#"{
        "format_version": 2,
        "tooth": "example.com/app",
        "version": "1.0.0",
        "dependencies": {
            "example.com/a": ">=1.0.0 <2.0.0",
            "example.com/b": "0.2.x"
        }
    }"#;
    let manifest = Manifest::from_bytes(json.as_bytes()).unwrap();
    let view = manifest.for_platform(&Platform::new("linux", "amd64"));

    let mut available = HashMap::new();
    available.insert("example.com/a".to_string(), parse_version_list(VERSION_LIST));
    available.insert(
        "example.com/b".to_string(),
        parse_version_list("v0.2.0\nv0.2.5\nv0.3.0\n"),
    );

    let resolved = resolve_dependencies(view.dependencies, &available).unwrap();
    assert_eq!(resolved["example.com/a"], v("1.1.0"));
    assert_eq!(resolved["example.com/b"], v("0.2.5"));

    available.insert("example.com/b".to_string(), parse_version_list("v0.3.0\n"));
    assert!(matches!(
        resolve_dependencies(view.dependencies, &available),
        Err(ResolverError::NoMatchingVersion { .. })
    ));
}
