//! Version selection
//!
//! Picks concrete versions out of the version lists published by a module
//! proxy. Only direct requirements are resolved; transitive dependencies are
//! the installer's concern.

use crate::requirement::Requirement;
use crate::semver::{Constraint, Version};
use crate::specifier::{Specifier, SpecifierError};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Suffix the module proxy appends to versions of major 2 and above
const INCOMPATIBLE_SUFFIX: &str = "+incompatible";

/// Errors that can occur during version resolution
#[derive(Debug, Error)]
pub enum ResolverError {
    /// No version found that satisfies the requirement
    #[error("No version of {package} satisfies requirement {requirement}")]
    NoMatchingVersion {
        package: String,
        requirement: String,
    },

    /// Requested version is not published
    #[error("Version {version} of {package} is not available")]
    VersionNotFound { package: String, version: String },

    /// Only pre-releases are published
    #[error("No stable version of {0} is available")]
    NoStableVersion(String),

    /// Version list unknown for a package
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Specifier cannot be resolved
    #[error(transparent)]
    Specifier(#[from] SpecifierError),
}

/// Parse a module proxy `@v/list` body
///
/// One version per line, with a leading `v` and an optional
/// `+incompatible` suffix. Unparseable lines are skipped. The result is
/// sorted ascending without duplicates.
pub fn parse_version_list(body: &str) -> Vec<Version> {
    let mut versions: Vec<Version> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let raw = line.strip_prefix('v').unwrap_or(line);
            let raw = raw.strip_suffix(INCOMPATIBLE_SUFFIX).unwrap_or(raw);
            match Version::parse(raw) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::debug!("Skipping version {:?}: {}", line, e);
                    None
                }
            }
        })
        .collect();

    versions.sort();
    versions.dedup();
    versions
}

/// Highest candidate satisfying `requirement`
///
/// A pre-release is only selected through a clause that names a pre-release
/// itself, so `>=1.0.0 <2.0.0` never picks `2.0.0-rc.1`.
pub fn select_version<'a>(
    requirement: &Requirement,
    candidates: &'a [Version],
) -> Option<&'a Version> {
    candidates
        .iter()
        .filter(|v| admits(requirement, v))
        .max_by(|a, b| a.cmp_precedence(b))
}

fn admits(requirement: &Requirement, version: &Version) -> bool {
    if !version.is_prerelease() {
        return requirement.satisfies(version);
    }

    requirement.clauses().iter().any(|clause| {
        clause.iter().any(Constraint::names_prerelease)
            && clause.iter().all(|c| c.matches(version))
    })
}

/// Highest candidate that is not a pre-release
pub fn latest_stable(candidates: &[Version]) -> Option<&Version> {
    candidates
        .iter()
        .filter(|v| !v.is_prerelease())
        .max_by(|a, b| a.cmp_precedence(b))
}

/// Resolve a repo specifier against the published versions of its tooth
///
/// A versioned specifier must name a published version. An unversioned one
/// resolves to the latest stable version.
pub fn resolve_specifier(
    specifier: &Specifier,
    candidates: &[Version],
) -> Result<Version, ResolverError> {
    let repo = specifier.repo()?;

    if specifier.is_version_specified() {
        let wanted = specifier.version()?;
        return candidates
            .iter()
            .find(|v| v.cmp_precedence(wanted).is_eq())
            .cloned()
            .ok_or_else(|| ResolverError::VersionNotFound {
                package: repo.to_string(),
                version: wanted.to_string(),
            });
    }

    let version = latest_stable(candidates)
        .cloned()
        .ok_or_else(|| ResolverError::NoStableVersion(repo.to_string()))?;
    tracing::debug!("Resolved {} to {}", repo, version);
    Ok(version)
}

/// Select a version for every dependency
///
/// `available` maps each dependency to its published versions.
pub fn resolve_dependencies(
    dependencies: &BTreeMap<String, Requirement>,
    available: &HashMap<String, Vec<Version>>,
) -> Result<BTreeMap<String, Version>, ResolverError> {
    let mut resolved = BTreeMap::new();

    for (package, requirement) in dependencies {
        let candidates = available
            .get(package)
            .ok_or_else(|| ResolverError::PackageNotFound(package.clone()))?;

        let version = select_version(requirement, candidates).ok_or_else(|| {
            ResolverError::NoMatchingVersion {
                package: package.clone(),
                requirement: requirement.to_string(),
            }
        })?;

        tracing::debug!("Resolved {} {} to {}", package, requirement, version);
        resolved.insert(package.clone(), version.clone());
    }

    Ok(resolved)
}
