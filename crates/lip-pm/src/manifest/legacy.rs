//! Legacy (format 1) tooth manifests
//!
//! Format 1 tags individual commands and placements with the platform they
//! apply to and writes dependencies as a list of AND-lists of version
//! tokens. These manifests are only read, never written; see
//! [`migrate`](super::migrate) for the upgrade path.

use super::schema;
use super::ManifestError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A decoded format 1 manifest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyManifest {
    #[serde(deserialize_with = "schema::integer")]
    pub format_version: i64,

    pub tooth: String,

    pub version: String,

    /// Each dependency is an OR of AND-lists of constraint tokens
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<Vec<String>>>,

    #[serde(default)]
    pub information: LegacyInformation,

    #[serde(default)]
    pub placement: Vec<LegacyPlacement>,

    /// Paths kept on uninstall
    #[serde(default)]
    pub possession: Vec<String>,

    #[serde(default)]
    pub commands: Vec<LegacyCommand>,
}

/// The descriptive fields carried over into `info`
///
/// Other keys of the `information` object are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LegacyInformation {
    pub name: String,
    pub description: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyPlacement {
    pub source: String,

    pub destination: String,

    /// Empty means any OS
    #[serde(rename = "GOOS", default)]
    pub goos: String,

    /// Empty means any architecture
    #[serde(rename = "GOARCH", default)]
    pub goarch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyCommand {
    #[serde(rename = "type")]
    pub kind: LegacyCommandKind,

    pub commands: Vec<String>,

    #[serde(rename = "GOOS")]
    pub goos: String,

    #[serde(rename = "GOARCH", default)]
    pub goarch: String,
}

/// When a legacy command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyCommandKind {
    Install,
    Uninstall,
}

impl LegacyManifest {
    /// Parse a format 1 manifest from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ManifestError::decode("$", e))?;
        Self::from_value(value)
    }

    pub(super) fn from_value(value: Value) -> Result<Self, ManifestError> {
        let violations = schema::validate(&value, &schema::LEGACY);
        if !violations.is_empty() {
            return Err(ManifestError::SchemaInvalid(violations));
        }

        serde_json::from_value(value).map_err(|e| ManifestError::decode("$", e))
    }
}
