//! Tooth commands
//!
//! Implements the commands behind the `lip` binary: tooth init, tooth
//! migrate and cache purge.

pub mod cache;
pub mod init;
pub mod migrate;

pub use cache::purge_cache;
pub use init::{init_tooth, InitError, ToothInit, MANIFEST_FILE};
pub use migrate::{migrate_file, MigrateOutcome};
