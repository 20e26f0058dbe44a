//! Manifest migration command
//!
//! Upgrades a legacy tooth.json in place.

use crate::manifest::{migrate_manifest, ManifestDocument, ManifestError};
use crate::platform::Platform;
use std::fs;
use std::path::Path;

/// Outcome of migrating a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateOutcome {
    /// File was legacy and has been rewritten
    Migrated,
    /// File was already current and was left untouched
    AlreadyCurrent,
}

/// Rewrite a legacy manifest file in the current format for `platform`
///
/// Nothing is written unless migration succeeds.
pub fn migrate_file(path: &Path, platform: &Platform) -> Result<MigrateOutcome, ManifestError> {
    let content = fs::read(path)?;

    match ManifestDocument::from_bytes(&content)? {
        ManifestDocument::Current(_) => {
            tracing::info!("{} is already in the current format", path.display());
            Ok(MigrateOutcome::AlreadyCurrent)
        }
        ManifestDocument::Legacy(legacy) => {
            let manifest = migrate_manifest(&legacy, platform)?;
            manifest.to_file(path)?;
            tracing::info!("Migrated {} for {}", path.display(), platform);
            Ok(MigrateOutcome::Migrated)
        }
    }
}
