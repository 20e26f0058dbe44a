//! Format 1 to format 2 migration
//!
//! Legacy commands and placements are filtered against the target platform
//! while migrating. Rules for other platforms are dropped, not turned into
//! platform blocks, so the result is only valid on the platform it was
//! migrated for.

use super::{
    insert_dependency, Commands, Files, Info, LegacyCommandKind, LegacyManifest, Manifest,
    ManifestError, Placement,
};
use crate::platform::Platform;
use crate::requirement::Requirement;
use crate::semver::Version;
use std::collections::BTreeMap;

/// Migrate a legacy manifest document to the current format for `platform`
pub fn migrate(bytes: &[u8], platform: &Platform) -> Result<Vec<u8>, ManifestError> {
    let legacy = LegacyManifest::from_bytes(bytes)?;
    migrate_manifest(&legacy, platform)?.to_bytes()
}

/// Convert a decoded legacy manifest into a current one for `platform`
pub fn migrate_manifest(
    legacy: &LegacyManifest,
    platform: &Platform,
) -> Result<Manifest, ManifestError> {
    let version =
        Version::parse(&legacy.version).map_err(|e| ManifestError::decode("version", e))?;

    let mut dependencies = BTreeMap::new();
    for (repo, matrix) in &legacy.dependencies {
        let field = format!("dependencies.{}", repo);
        let requirement =
            Requirement::from_matrix(matrix).map_err(|e| ManifestError::decode(&field, e))?;
        insert_dependency(&mut dependencies, &field, repo, requirement)?;
    }

    let mut commands = Commands::default();
    for command in &legacy.commands {
        if !platform.matches(&command.goos, &command.goarch) {
            continue;
        }
        let phase = match command.kind {
            LegacyCommandKind::Install => &mut commands.post_install,
            LegacyCommandKind::Uninstall => &mut commands.pre_uninstall,
        };
        phase.extend(command.commands.iter().cloned());
    }

    let place = legacy
        .placement
        .iter()
        .filter(|p| platform.matches(&p.goos, &p.goarch))
        .map(|p| Placement {
            src: p.source.clone(),
            dest: p.destination.clone(),
        })
        .collect();

    let manifest = Manifest {
        tooth: legacy.tooth.to_lowercase(),
        version,
        info: Info {
            name: legacy.information.name.clone(),
            description: legacy.information.description.clone(),
            author: legacy.information.author.clone(),
        },
        commands,
        dependencies,
        files: Files {
            place,
            preserve: legacy.possession.clone(),
        },
        platforms: Vec::new(),
    };

    manifest.validate()?;
    Ok(manifest)
}
