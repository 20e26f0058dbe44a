//! Integration tests for legacy tooth.json migration

use lip_pm::manifest::{migrate, LegacyManifest};
use lip_pm::{Manifest, ManifestError, Platform};

const LEGACY: &str = r#"{
    "format_version": 1,
    "tooth": "github.com/tooth-hub/LLBDS3",
    "version": "2.9.2",
    "dependencies": {
        "github.com/tooth-hub/bds": [["1.19.72"]],
        "github.com/tooth-hub/litexloader": [[">=2.9.0", "<3.0.0"], ["2.8.x"]]
    },
    "information": {
        "name": "LiteLoaderBDS",
        "description": "Plugin loader for BDS",
        "author": "LiteLDev",
        "license": "LGPL-3.0",
        "homepage": "https://litebds.com"
    },
    "placement": [
        { "source": "LiteLoader.dll", "destination": "LiteLoader.dll", "GOOS": "windows" },
        { "source": "libLiteLoader.so", "destination": "libLiteLoader.so", "GOOS": "linux" },
        { "source": "arm/lib.so", "destination": "lib.so", "GOOS": "linux", "GOARCH": "arm64" },
        { "source": "plugins/", "destination": "plugins/" }
    ],
    "possession": ["plugins/LiteLoader/"],
    "commands": [
        { "type": "install", "commands": ["setup.exe"], "GOOS": "windows" },
        { "type": "install", "commands": ["./setup.sh"], "GOOS": "linux" },
        { "type": "uninstall", "commands": ["./cleanup.sh"], "GOOS": "linux", "GOARCH": "amd64" }
    ]
}"#;

fn migrate_for(os: &str, arch: &str) -> Manifest {
    let bytes = migrate(LEGACY.as_bytes(), &Platform::new(os, arch)).unwrap();
    Manifest::from_bytes(&bytes).unwrap()
}

fn sources(manifest: &Manifest) -> Vec<&str> {
    manifest.files.place.iter().map(|p| p.src.as_str()).collect()
}

#[test]
fn test_linux_amd64() {
    let m = migrate_for("linux", "amd64");
    assert_eq!(sources(&m), vec!["libLiteLoader.so", "plugins/"]);
    assert_eq!(m.commands.post_install, vec!["./setup.sh"]);
    assert_eq!(m.commands.pre_uninstall, vec!["./cleanup.sh"]);
}

#[test]
fn test_linux_arm64() {
    let m = migrate_for("linux", "arm64");
    assert_eq!(sources(&m), vec!["libLiteLoader.so", "arm/lib.so", "plugins/"]);
    assert!(m.commands.pre_uninstall.is_empty());
}

#[test]
fn test_windows() {
    let m = migrate_for("windows", "amd64");
    assert_eq!(sources(&m), vec!["LiteLoader.dll", "plugins/"]);
    assert_eq!(m.commands.post_install, vec!["setup.exe"]);
}

#[test]
fn test_other_platform_keeps_only_unscoped_rules() {
    let m = migrate_for("darwin", "arm64");
    assert_eq!(sources(&m), vec!["plugins/"]);
    assert!(m.commands.is_empty());
}

#[test]
fn test_common_fields_carried() {
    let m = migrate_for("linux", "amd64");
    assert_eq!(m.tooth, "github.com/tooth-hub/llbds3");
    assert_eq!(m.version.to_string(), "2.9.2");
    assert_eq!(m.info.name, "LiteLoaderBDS");
    assert_eq!(m.info.author, "LiteLDev");
    assert_eq!(m.files.preserve, vec!["plugins/LiteLoader/"]);
    assert!(m.platforms.is_empty());
    assert_eq!(
        m.dependencies["github.com/tooth-hub/litexloader"].to_string(),
        ">=2.9.0 <3.0.0 || 2.8.x"
    );
    assert_eq!(m.dependencies["github.com/tooth-hub/bds"].to_string(), "1.19.72");
}

#[test]
fn test_output_is_deterministic() {
    let platform = Platform::new("linux", "amd64");
    let first = migrate(LEGACY.as_bytes(), &platform).unwrap();
    for _ in 0..5 {
        assert_eq!(migrate(LEGACY.as_bytes(), &platform).unwrap(), first);
    }
}

#[test]
fn test_legacy_decode() {
    let legacy = LegacyManifest::from_bytes(LEGACY.as_bytes()).unwrap();
    assert_eq!(legacy.placement.len(), 4);
    assert_eq!(legacy.commands.len(), 3);
}

#[test]
fn test_current_input_rejected() {
    let current = br#"{"format_version": 2, "tooth": "a.com/b", "version": "1.0.0"}"#;
    assert!(matches!(
        migrate(current, &Platform::new("linux", "amd64")),
        Err(ManifestError::SchemaInvalid(_))
    ));
}

#[test]
fn test_empty_dependency_matrix_rejected() {
    let json = br#"{"format_version": 1, "tooth": "a.com/b", "version": "1.0.0",
        "dependencies": {"a.com/c": [[]]}}"#;
    assert!(matches!(
        migrate(json, &Platform::new("linux", "amd64")),
        Err(ManifestError::DecodeError { .. })
    ));
}
