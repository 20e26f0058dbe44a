//! Semantic versioning parser and constraint matching
//!
//! Versions have the form `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
//! Constraints are the single tokens used by tooth dependency expressions:
//! `[>|>=|<|<=|!]MAJOR.MINOR.PATCH` or the wildcard `MAJOR.MINOR.x`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during semver parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemverError {
    /// Invalid version format
    #[error("Invalid version format: {0}")]
    InvalidVersion(String),

    /// Invalid constraint format
    #[error("Invalid constraint format: {0}")]
    InvalidConstraint(String),

    /// Invalid pre-release tag
    #[error("Invalid pre-release tag: {0}")]
    InvalidPrerelease(String),
}

/// Semantic version (MAJOR.MINOR.PATCH)
///
/// Build metadata does not take part in precedence. It only breaks ties in
/// `Ord` so that ordering stays consistent with equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

/// A single version-matching token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Exact version (1.2.3)
    Exact(Version),

    /// Greater than (>1.2.3)
    GreaterThan(Version),

    /// Greater than or equal (>=1.2.3)
    GreaterThanOrEqual(Version),

    /// Less than (<1.2.3)
    LessThan(Version),

    /// Less than or equal (<=1.2.3)
    LessThanOrEqual(Version),

    /// Anything but this version (!1.2.3)
    NotEqual(Version),

    /// Any stable patch of MAJOR.MINOR (1.2.x)
    Wildcard { major: u64, minor: u64 },
}

impl Version {
    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self, SemverError> {
        // Split by + to separate build metadata
        let (version_part, build) = match s.split_once('+') {
            Some((v, b)) => (v, Some(b)),
            None => (s, None),
        };

        // Split by - to separate prerelease
        let (core_version, prerelease) = match version_part.split_once('-') {
            Some((v, p)) => (v, Some(p)),
            None => (version_part, None),
        };

        let parts: Vec<&str> = core_version.split('.').collect();
        if parts.len() != 3 {
            return Err(SemverError::InvalidVersion(format!(
                "Expected MAJOR.MINOR.PATCH, got '{}'",
                s
            )));
        }

        let major = parse_numeric(parts[0], "major", s)?;
        let minor = parse_numeric(parts[1], "minor", s)?;
        let patch = parse_numeric(parts[2], "patch", s)?;

        if let Some(pre) = prerelease {
            if !is_valid_identifiers(pre) {
                return Err(SemverError::InvalidPrerelease(s.to_string()));
            }
        }

        if let Some(b) = build {
            if !is_valid_identifiers(b) {
                return Err(SemverError::InvalidVersion(format!(
                    "Invalid build metadata in '{}'",
                    s
                )));
            }
        }

        Ok(Version {
            major,
            minor,
            patch,
            prerelease: prerelease.map(str::to_string),
            build: build.map(str::to_string),
        })
    }

    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Attach a pre-release label
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = Some(prerelease.into());
        self
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Compare by semver precedence, ignoring build metadata
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| {
                compare_prerelease(self.prerelease.as_deref(), other.prerelease.as_deref())
            })
    }
}

/// Digits only, no leading zeros, so every accepted string round-trips.
fn parse_numeric(part: &str, what: &str, input: &str) -> Result<u64, SemverError> {
    let well_formed = !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && !(part.len() > 1 && part.starts_with('0'));

    if !well_formed {
        return Err(SemverError::InvalidVersion(format!(
            "Invalid {} version '{}' in '{}'",
            what, part, input
        )));
    }

    part.parse().map_err(|_| {
        SemverError::InvalidVersion(format!("{} version out of range in '{}'", what, input))
    })
}

fn is_valid_identifiers(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|id| {
            !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

fn compare_prerelease(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        // A pre-release sorts before the release it precedes
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let mut left = a.split('.');
            let mut right = b.split('.');
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some(x), Some(y)) => match compare_identifier(x, y) {
                        Ordering::Equal => {}
                        ord => return ord,
                    },
                }
            }
        }
    }
}

fn compare_identifier(a: &str, b: &str) -> Ordering {
    let is_numeric = |s: &str| s.bytes().all(|c| c.is_ascii_digit());

    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            // Compare as unbounded integers
            let (ta, tb) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
            ta.len()
                .cmp(&tb.len())
                .then_with(|| ta.cmp(tb))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = SemverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_precedence(other)
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Constraint {
    /// Parse a constraint token
    pub fn parse(s: &str) -> Result<Self, SemverError> {
        let target = |rest: &str| {
            Version::parse(rest)
                .map_err(|e| SemverError::InvalidConstraint(format!("'{}': {}", s, e)))
        };

        // Two-character operators first so ">=" is not read as ">"
        if let Some(rest) = s.strip_prefix(">=") {
            return Ok(Constraint::GreaterThanOrEqual(target(rest)?));
        }

        if let Some(rest) = s.strip_prefix("<=") {
            return Ok(Constraint::LessThanOrEqual(target(rest)?));
        }

        if let Some(rest) = s.strip_prefix('>') {
            return Ok(Constraint::GreaterThan(target(rest)?));
        }

        if let Some(rest) = s.strip_prefix('<') {
            return Ok(Constraint::LessThan(target(rest)?));
        }

        if let Some(rest) = s.strip_prefix('!') {
            return Ok(Constraint::NotEqual(target(rest)?));
        }

        if let Some(prefix) = s.strip_suffix(".x") {
            return Self::parse_wildcard(prefix, s);
        }

        // Default: exact version
        Ok(Constraint::Exact(target(s)?))
    }

    /// Parse the MAJOR.MINOR part of a wildcard constraint (1.2.x)
    fn parse_wildcard(prefix: &str, s: &str) -> Result<Self, SemverError> {
        let invalid = || SemverError::InvalidConstraint(format!("Invalid wildcard: {}", s));

        let (major, minor) = prefix.split_once('.').ok_or_else(invalid)?;
        let major = parse_numeric(major, "major", s).map_err(|_| invalid())?;
        let minor = parse_numeric(minor, "minor", s).map_err(|_| invalid())?;

        Ok(Constraint::Wildcard { major, minor })
    }

    /// Check if a version satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Constraint::Exact(v) => version.cmp_precedence(v) == Ordering::Equal,
            Constraint::GreaterThan(v) => version.cmp_precedence(v) == Ordering::Greater,
            Constraint::GreaterThanOrEqual(v) => version.cmp_precedence(v) != Ordering::Less,
            Constraint::LessThan(v) => version.cmp_precedence(v) == Ordering::Less,
            Constraint::LessThanOrEqual(v) => version.cmp_precedence(v) != Ordering::Greater,
            Constraint::NotEqual(v) => version.cmp_precedence(v) != Ordering::Equal,

            // Wildcards only ever select stable releases
            Constraint::Wildcard { major, minor } => {
                version.major == *major && version.minor == *minor && !version.is_prerelease()
            }
        }
    }

    /// Check if this constraint targets a pre-release version
    ///
    /// Exclusions never count, so `!1.0.0-rc.1` does not opt in.
    pub fn names_prerelease(&self) -> bool {
        match self {
            Constraint::Exact(v)
            | Constraint::GreaterThan(v)
            | Constraint::GreaterThanOrEqual(v)
            | Constraint::LessThan(v)
            | Constraint::LessThanOrEqual(v) => v.is_prerelease(),
            Constraint::NotEqual(_) | Constraint::Wildcard { .. } => false,
        }
    }
}

impl FromStr for Constraint {
    type Err = SemverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraint::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Exact(v) => write!(f, "{}", v),
            Constraint::GreaterThan(v) => write!(f, ">{}", v),
            Constraint::GreaterThanOrEqual(v) => write!(f, ">={}", v),
            Constraint::LessThan(v) => write!(f, "<{}", v),
            Constraint::LessThanOrEqual(v) => write!(f, "<={}", v),
            Constraint::NotEqual(v) => write!(f, "!{}", v),
            Constraint::Wildcard { major, minor } => write!(f, "{}.{}.x", major, minor),
        }
    }
}
