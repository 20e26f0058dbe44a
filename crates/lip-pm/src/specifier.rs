//! Tooth specifiers
//!
//! A specifier names what the user wants installed: either a local tooth
//! archive (`foo.tth`) or a tooth repository with an optional version
//! (`github.com/tooth-hub/llbds3@1.0.0`).

use crate::semver::Version;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// File extension of tooth archives
pub const ARCHIVE_EXTENSION: &str = ".tth";

/// Errors that can occur while parsing or inspecting a specifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecifierError {
    /// String is neither an archive path nor a valid repo reference
    #[error("Invalid specifier: {0}")]
    InvalidSpecifier(String),

    /// Accessor used on the wrong kind of specifier
    #[error("Specifier is not a {expected}: {specifier}")]
    KindMismatch {
        expected: SpecifierKind,
        specifier: String,
    },

    /// Repo specifier carries no version
    #[error("Tooth version is not specified: {0}")]
    VersionNotSpecified(String),
}

/// The two kinds of specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    ToothArchive,
    ToothRepo,
}

impl fmt::Display for SpecifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecifierKind::ToothArchive => f.write_str("tooth archive"),
            SpecifierKind::ToothRepo => f.write_str("tooth repo"),
        }
    }
}

/// A parsed specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    /// Local archive, kept verbatim
    ToothArchive { path: String },

    /// Lower-cased repository path and optional version
    ToothRepo {
        repo: String,
        version: Option<Version>,
    },
}

impl Specifier {
    /// Parse a raw specifier string
    pub fn parse(raw: &str) -> Result<Self, SpecifierError> {
        if raw.ends_with(ARCHIVE_EXTENSION) {
            return Ok(Specifier::ToothArchive {
                path: raw.to_string(),
            });
        }

        // Tooth repo strings should be lower case.
        let lowered = raw.to_lowercase();
        let invalid = || SpecifierError::InvalidSpecifier(lowered.clone());

        let (repo, version) = match lowered.split_once('@') {
            Some((repo, version)) => (repo, Some(version)),
            None => (lowered.as_str(), None),
        };

        if !is_valid_repo_path(repo) {
            return Err(invalid());
        }

        let version = version
            .map(|v| Version::parse(v).map_err(|_| invalid()))
            .transpose()?;

        // Module proxies cannot serve build metadata.
        if version.as_ref().is_some_and(|v| v.build.is_some()) {
            return Err(invalid());
        }

        Ok(Specifier::ToothRepo {
            repo: repo.to_string(),
            version,
        })
    }

    pub fn kind(&self) -> SpecifierKind {
        match self {
            Specifier::ToothArchive { .. } => SpecifierKind::ToothArchive,
            Specifier::ToothRepo { .. } => SpecifierKind::ToothRepo,
        }
    }

    /// Whether this is a repo specifier with a version
    pub fn is_version_specified(&self) -> bool {
        matches!(self, Specifier::ToothRepo { version: Some(_), .. })
    }

    /// Path of the tooth archive
    pub fn archive_path(&self) -> Result<&str, SpecifierError> {
        match self {
            Specifier::ToothArchive { path } => Ok(path),
            Specifier::ToothRepo { .. } => Err(self.mismatch(SpecifierKind::ToothArchive)),
        }
    }

    /// Repository path of the tooth
    pub fn repo(&self) -> Result<&str, SpecifierError> {
        match self {
            Specifier::ToothRepo { repo, .. } => Ok(repo),
            Specifier::ToothArchive { .. } => Err(self.mismatch(SpecifierKind::ToothRepo)),
        }
    }

    /// Requested version of the tooth
    pub fn version(&self) -> Result<&Version, SpecifierError> {
        match self {
            Specifier::ToothRepo {
                version: Some(version),
                ..
            } => Ok(version),
            Specifier::ToothRepo { repo, version: None } => {
                Err(SpecifierError::VersionNotSpecified(repo.clone()))
            }
            Specifier::ToothArchive { .. } => Err(self.mismatch(SpecifierKind::ToothRepo)),
        }
    }

    fn mismatch(&self, expected: SpecifierKind) -> SpecifierError {
        SpecifierError::KindMismatch {
            expected,
            specifier: self.to_string(),
        }
    }
}

/// Unversioned repo specifiers render as the bare repository path.
impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specifier::ToothArchive { path } => f.write_str(path),
            Specifier::ToothRepo {
                repo,
                version: Some(version),
            } => write!(f, "{}@{}", repo, version),
            Specifier::ToothRepo {
                repo,
                version: None,
            } => f.write_str(repo),
        }
    }
}

impl FromStr for Specifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specifier::parse(s)
    }
}

/// Check a tooth repository path: `[a-z0-9][a-z0-9-_./]*`
pub fn is_valid_repo_path(path: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-_./]*$").expect("valid regex"))
        .is_match(path)
}
