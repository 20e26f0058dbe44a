//! lip tooth package manager library
//!
//! This crate provides the core of the lip package manager, including:
//! - Semantic versions and version constraints
//! - Dependency requirements (OR of AND-clauses of constraints)
//! - Tooth specifiers (archive paths and repo@version references)
//! - tooth.json parsing, validation and legacy format migration
//! - Cache keys, mirror rewriting and module proxy URLs
//! - Version selection against proxy version lists
//! - Configuration and the commands behind the `lip` binary

pub mod commands;
pub mod config;
pub mod manifest;
pub mod platform;
pub mod requirement;
pub mod resolver;
pub mod semver;
pub mod specifier;
pub mod url;

pub use config::{Config, ConfigError};
pub use manifest::{
    migrate, Commands, Files, Info, Manifest, ManifestDocument, ManifestError, Placement,
    PlatformOverride, PlatformView, SchemaViolation,
};
pub use platform::Platform;
pub use requirement::Requirement;
pub use resolver::ResolverError;
pub use semver::{Constraint, SemverError, Version};
pub use specifier::{Specifier, SpecifierError, SpecifierKind};
