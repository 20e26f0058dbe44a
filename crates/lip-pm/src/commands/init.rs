//! Tooth initialization command
//!
//! Creates a new tooth.json in a directory.

use crate::manifest::{Info, Manifest, ManifestError};
use crate::semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Manifest file name of a tooth
pub const MANIFEST_FILE: &str = "tooth.json";

/// Errors that can occur during tooth initialization
#[derive(Debug, Error)]
pub enum InitError {
    /// Tooth already exists
    #[error("Tooth already exists: tooth.json found in {0}")]
    AlreadyExists(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The answers do not form a valid manifest
    #[error("Some information is invalid: {0}")]
    InvalidInformation(#[from] ManifestError),
}

/// Answers for a new tooth
#[derive(Debug, Clone, Default)]
pub struct ToothInit {
    /// Repository path, e.g. `github.com/tooth-hub/llbds3`
    pub tooth: String,
    pub name: String,
    pub description: String,
    /// GitHub username
    pub author: String,
}

/// Initialize a new tooth
///
/// Writes a format 2 tooth.json at version 0.0.0 into `dir` and returns its
/// path. The tooth path is lower-cased.
pub fn init_tooth(dir: &Path, answers: &ToothInit) -> Result<PathBuf, InitError> {
    let manifest_path = dir.join(MANIFEST_FILE);

    if manifest_path.exists() {
        return Err(InitError::AlreadyExists(dir.display().to_string()));
    }

    let mut manifest = Manifest::new(answers.tooth.to_lowercase(), Version::new(0, 0, 0));
    manifest.info = Info {
        name: answers.name.clone(),
        description: answers.description.clone(),
        author: answers.author.clone(),
    };

    // Round-trip through the parser so the file is known to load.
    let content = manifest.to_bytes()?;
    Manifest::from_bytes(&content)?;

    fs::create_dir_all(dir)?;
    manifest.to_file(&manifest_path)?;

    tracing::info!("Successfully initialized a new tooth: {}", manifest.tooth);

    Ok(manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers() -> ToothInit {
        ToothInit {
            tooth: "GitHub.com/Tooth-Hub/Example".to_string(),
            name: "Example".to_string(),
            description: "An example tooth".to_string(),
            author: "someone".to_string(),
        }
    }

    #[test]
    fn test_init_tooth() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tooth_dir = temp_dir.path().join("example");

        let path = init_tooth(&tooth_dir, &answers()).unwrap();
        assert_eq!(path, tooth_dir.join("tooth.json"));

        let manifest = Manifest::from_file(&path).unwrap();
        assert_eq!(manifest.tooth, "github.com/tooth-hub/example");
        assert_eq!(manifest.version, Version::new(0, 0, 0));
        assert_eq!(manifest.info.author, "someone");
    }

    #[test]
    fn test_init_already_exists() {
        let temp_dir = tempfile::tempdir().unwrap();

        init_tooth(temp_dir.path(), &answers()).unwrap();

        let result = init_tooth(temp_dir.path(), &answers());
        assert!(matches!(result, Err(InitError::AlreadyExists(_))));
    }

    #[test]
    fn test_init_rejects_invalid_tooth_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let bad = ToothInit {
            tooth: "not a path".to_string(),
            ..answers()
        };

        let result = init_tooth(temp_dir.path(), &bad);
        assert!(matches!(result, Err(InitError::InvalidInformation(_))));
        assert!(!temp_dir.path().join("tooth.json").exists());
    }
}
