//! Tooth manifest parsing (tooth.json)
//!
//! Decoding runs in three stages: the raw JSON is checked against the schema
//! of its declared format version, then decoded into serde structs, then
//! converted into the strongly typed [`Manifest`] with semantic checks on
//! paths, versions and requirement expressions.
//!
//! Legacy (format 1) manifests are read through [`ManifestDocument`] and
//! upgraded by [`migrate`]. Migration resolves per-platform rules for one
//! target platform, so a migrated manifest only carries the rules of the
//! platform it was migrated for.

mod legacy;
mod migration;
mod schema;

pub use legacy::{
    LegacyCommand, LegacyCommandKind, LegacyInformation, LegacyManifest, LegacyPlacement,
};
pub use migration::{migrate, migrate_manifest};
pub use schema::{SchemaViolation, CURRENT_FORMAT_VERSION, LEGACY_FORMAT_VERSION};

use crate::platform::Platform;
use crate::requirement::Requirement;
use crate::semver::Version;
use crate::specifier::is_valid_repo_path;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur during manifest parsing
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read or write manifest file
    #[error("Failed to access manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Document does not match the schema of its format version
    #[error("Manifest does not match schema: {}", join_violations(.0))]
    SchemaInvalid(Vec<SchemaViolation>),

    /// Schema-valid document with a field that failed semantic checks
    #[error("Failed to decode manifest field '{field}': {message}")]
    DecodeError { field: String, message: String },

    /// Failed to serialize manifest
    #[error("Failed to encode manifest: {0}")]
    EncodeError(String),
}

impl ManifestError {
    pub(crate) fn decode(field: impl Into<String>, message: impl Display) -> Self {
        ManifestError::DecodeError {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tooth manifest in the current format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Lower-case tooth repository path
    pub tooth: String,

    pub version: Version,

    pub info: Info,

    pub commands: Commands,

    /// Requirements keyed by dependency repository path
    pub dependencies: BTreeMap<String, Requirement>,

    pub files: Files,

    /// Per-platform replacements for commands, dependencies and files
    pub platforms: Vec<PlatformOverride>,
}

/// Descriptive information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub author: String,
}

/// Lifecycle commands, by phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commands {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_install: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_install: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_uninstall: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_uninstall: Vec<String>,
}

impl Commands {
    pub fn is_empty(&self) -> bool {
        self.pre_install.is_empty()
            && self.post_install.is_empty()
            && self.pre_uninstall.is_empty()
            && self.post_uninstall.is_empty()
    }
}

/// File placement and preservation rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Files {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub place: Vec<Placement>,

    /// Paths kept on uninstall
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preserve: Vec<String>,
}

impl Files {
    pub fn is_empty(&self) -> bool {
        self.place.is_empty() && self.preserve.is_empty()
    }
}

/// Copy `src` from the tooth into `dest` in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub src: String,
    pub dest: String,
}

/// Rules that replace the top-level ones on a matching platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOverride {
    pub goos: String,

    /// Any architecture when unset
    pub goarch: Option<String>,

    pub commands: Commands,

    pub dependencies: BTreeMap<String, Requirement>,

    pub files: Files,
}

/// Commands, dependencies and files in effect on one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformView<'a> {
    pub commands: &'a Commands,
    pub dependencies: &'a BTreeMap<String, Requirement>,
    pub files: &'a Files,
}

/// A manifest of either supported format
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestDocument {
    Legacy(LegacyManifest),
    Current(Manifest),
}

impl ManifestDocument {
    /// Decode a manifest, dispatching on its declared `format_version`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        let value = parse_json(bytes)?;

        match schema::declared_format_version(&value) {
            Some(LEGACY_FORMAT_VERSION) => Ok(ManifestDocument::Legacy(
                LegacyManifest::from_value(value)?,
            )),
            Some(CURRENT_FORMAT_VERSION) => {
                Ok(ManifestDocument::Current(Manifest::from_value(value)?))
            }
            declared => Err(ManifestError::SchemaInvalid(vec![SchemaViolation {
                path: "$.format_version".to_string(),
                message: match declared {
                    Some(v) => format!("unsupported format version {}", v),
                    None => "is required and must be an integer".to_string(),
                },
            }])),
        }
    }

    pub fn format_version(&self) -> i64 {
        match self {
            ManifestDocument::Legacy(_) => LEGACY_FORMAT_VERSION,
            ManifestDocument::Current(_) => CURRENT_FORMAT_VERSION,
        }
    }

    /// Get a current-format manifest, migrating legacy ones for `platform`
    pub fn into_current(self, platform: &Platform) -> Result<Manifest, ManifestError> {
        match self {
            ManifestDocument::Legacy(legacy) => migrate_manifest(&legacy, platform),
            ManifestDocument::Current(manifest) => Ok(manifest),
        }
    }
}

impl Manifest {
    /// Create a manifest with no dependencies, files or commands
    pub fn new(tooth: impl Into<String>, version: Version) -> Self {
        Self {
            tooth: tooth.into(),
            version,
            info: Info::default(),
            commands: Commands::default(),
            dependencies: BTreeMap::new(),
            files: Files::default(),
            platforms: Vec::new(),
        }
    }

    /// Parse a current-format manifest from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        Self::from_value(parse_json(bytes)?)
    }

    /// Parse a manifest of either format, migrating legacy ones for `platform`
    pub fn from_bytes_migrating(bytes: &[u8], platform: &Platform) -> Result<Self, ManifestError> {
        ManifestDocument::from_bytes(bytes)?.into_current(platform)
    }

    /// Parse a current-format manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read(path)?;
        Self::from_bytes(&content)
    }

    fn from_value(value: Value) -> Result<Self, ManifestError> {
        let violations = schema::validate(&value, &schema::CURRENT);
        if !violations.is_empty() {
            return Err(ManifestError::SchemaInvalid(violations));
        }

        let raw: RawManifest =
            serde_json::from_value(value).map_err(|e| ManifestError::decode("$", e))?;
        raw.into_manifest()
    }

    /// Serialize to pretty-printed JSON
    pub fn to_bytes(&self) -> Result<Vec<u8>, ManifestError> {
        serde_json::to_vec_pretty(&RawManifest::from(self))
            .map_err(|e| ManifestError::EncodeError(e.to_string()))
    }

    /// Write manifest to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ManifestError> {
        let mut content = self.to_bytes()?;
        content.push(b'\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the semantic rules the schema cannot express
    pub fn validate(&self) -> Result<(), ManifestError> {
        if !is_valid_repo_path(&self.tooth) {
            return Err(ManifestError::decode(
                "tooth",
                format!("invalid tooth path: {}", self.tooth),
            ));
        }

        validate_section("", &self.dependencies, &self.files)?;

        for (i, platform) in self.platforms.iter().enumerate() {
            if platform.goos.is_empty() {
                return Err(ManifestError::decode(
                    format!("platforms[{}].goos", i),
                    "must not be empty",
                ));
            }
            validate_section(
                &format!("platforms[{}].", i),
                &platform.dependencies,
                &platform.files,
            )?;
        }

        Ok(())
    }

    /// Select the rules in effect on `platform`
    ///
    /// A block matching both OS and architecture wins outright. Otherwise the
    /// last block matching the OS with no architecture applies. A selected
    /// block replaces the top-level commands, dependencies and files as a
    /// whole.
    pub fn for_platform(&self, platform: &Platform) -> PlatformView<'_> {
        let mut selected = None;

        for block in &self.platforms {
            if block.goos != platform.os {
                continue;
            }
            match &block.goarch {
                None => selected = Some(block),
                Some(arch) if *arch == platform.arch => {
                    selected = Some(block);
                    break;
                }
                Some(_) => {}
            }
        }

        match selected {
            Some(block) => PlatformView {
                commands: &block.commands,
                dependencies: &block.dependencies,
                files: &block.files,
            },
            None => PlatformView {
                commands: &self.commands,
                dependencies: &self.dependencies,
                files: &self.files,
            },
        }
    }
}

fn validate_section(
    prefix: &str,
    dependencies: &BTreeMap<String, Requirement>,
    files: &Files,
) -> Result<(), ManifestError> {
    for (repo, requirement) in dependencies {
        let field = format!("{}dependencies.{}", prefix, repo);
        if !is_valid_repo_path(repo) {
            return Err(ManifestError::decode(field, "invalid dependency tooth path"));
        }
        if requirement.is_empty() {
            return Err(ManifestError::decode(field, "empty requirement"));
        }
    }

    for (i, placement) in files.place.iter().enumerate() {
        if !is_valid_place_path(&placement.src) {
            return Err(ManifestError::decode(
                format!("{}files.place[{}].src", prefix, i),
                format!("invalid source: {}", placement.src),
            ));
        }
        if !is_valid_place_path(&placement.dest) {
            return Err(ManifestError::decode(
                format!("{}files.place[{}].dest", prefix, i),
                format!("invalid destination: {}", placement.dest),
            ));
        }
    }

    Ok(())
}

/// Placement paths start with a letter or digit and contain no whitespace
fn is_valid_place_path(path: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9]\S*$").expect("valid regex"))
        .is_match(path)
}

fn parse_json(bytes: &[u8]) -> Result<Value, ManifestError> {
    serde_json::from_slice(bytes).map_err(|e| ManifestError::decode("$", e))
}

/// Wire form of a current-format manifest
#[derive(Debug, Serialize, Deserialize)]
struct RawManifest {
    #[serde(deserialize_with = "schema::integer")]
    format_version: i64,
    tooth: String,
    version: String,

    #[serde(default)]
    info: Info,

    #[serde(default, skip_serializing_if = "Commands::is_empty")]
    commands: Commands,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    dependencies: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Files::is_empty")]
    files: Files,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    platforms: Vec<RawPlatform>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawPlatform {
    goos: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    goarch: Option<String>,

    #[serde(default, skip_serializing_if = "Commands::is_empty")]
    commands: Commands,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    dependencies: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Files::is_empty")]
    files: Files,
}

impl RawManifest {
    fn into_manifest(self) -> Result<Manifest, ManifestError> {
        // Tooth path should be lower case.
        let tooth = self.tooth.to_lowercase();

        let version =
            Version::parse(&self.version).map_err(|e| ManifestError::decode("version", e))?;

        let dependencies = decode_dependencies("", self.dependencies)?;

        let platforms = self
            .platforms
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                Ok(PlatformOverride {
                    goos: raw.goos,
                    goarch: raw.goarch.filter(|arch| !arch.is_empty()),
                    commands: raw.commands,
                    dependencies: decode_dependencies(
                        &format!("platforms[{}].", i),
                        raw.dependencies,
                    )?,
                    files: raw.files,
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        let manifest = Manifest {
            tooth,
            version,
            info: self.info,
            commands: self.commands,
            dependencies,
            files: self.files,
            platforms,
        };

        manifest.validate()?;
        Ok(manifest)
    }
}

fn decode_dependencies(
    prefix: &str,
    raw: BTreeMap<String, String>,
) -> Result<BTreeMap<String, Requirement>, ManifestError> {
    let mut dependencies = BTreeMap::new();
    for (repo, expression) in raw {
        let field = format!("{}dependencies.{}", prefix, repo);
        let requirement =
            Requirement::parse(&expression).map_err(|e| ManifestError::decode(&field, e))?;
        insert_dependency(&mut dependencies, &field, &repo, requirement)?;
    }
    Ok(dependencies)
}

/// Insert a dependency keyed by its lower-cased tooth path
///
/// Keys that differ only in case collide and are rejected.
pub(super) fn insert_dependency(
    dependencies: &mut BTreeMap<String, Requirement>,
    field: &str,
    repo: &str,
    requirement: Requirement,
) -> Result<(), ManifestError> {
    match dependencies.entry(repo.to_lowercase()) {
        Entry::Occupied(entry) => Err(ManifestError::decode(
            field,
            format!("duplicate dependency {}", entry.key()),
        )),
        Entry::Vacant(entry) => {
            entry.insert(requirement);
            Ok(())
        }
    }
}

impl From<&Manifest> for RawManifest {
    fn from(manifest: &Manifest) -> Self {
        RawManifest {
            format_version: CURRENT_FORMAT_VERSION,
            tooth: manifest.tooth.clone(),
            version: manifest.version.to_string(),
            info: manifest.info.clone(),
            commands: manifest.commands.clone(),
            dependencies: encode_dependencies(&manifest.dependencies),
            files: manifest.files.clone(),
            platforms: manifest
                .platforms
                .iter()
                .map(|p| RawPlatform {
                    goos: p.goos.clone(),
                    goarch: p.goarch.clone(),
                    commands: p.commands.clone(),
                    dependencies: encode_dependencies(&p.dependencies),
                    files: p.files.clone(),
                })
                .collect(),
        }
    }
}

fn encode_dependencies(dependencies: &BTreeMap<String, Requirement>) -> BTreeMap<String, String> {
    dependencies
        .iter()
        .map(|(repo, requirement)| (repo.clone(), requirement.to_string()))
        .collect()
}
