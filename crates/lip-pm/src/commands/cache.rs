//! Cache maintenance command

use crate::url::{CacheError, DownloadCache};
use std::path::Path;

/// Remove every cached download under `dir`
pub fn purge_cache(dir: &Path) -> Result<(), CacheError> {
    DownloadCache::new(dir).purge()
}
