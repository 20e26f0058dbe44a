//! Download cache management
//!
//! Downloads are stored flat under the cache root, one file per URL, named
//! by [`cache_key`]. A file is only ever moved into place once complete, so
//! its presence is enough to skip a download.

use super::fetch::{Downloader, FetchError};
use super::locator::cache_key;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Suffix of in-progress downloads
const PARTIAL_SUFFIX: &str = ".part";

/// Errors that can occur during caching
#[derive(Debug, Error)]
pub enum CacheError {
    /// Fetch error
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] FetchError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Cache of downloaded files, keyed by URL
#[derive(Debug, Clone)]
pub struct DownloadCache {
    /// Cache root directory (~/.lip/cache/)
    root: PathBuf,
}

impl DownloadCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cache file for a URL
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let path = self.root.join(cache_key(url));
        tracing::debug!("Cache path of {} is {}", url, path.display());
        path
    }

    /// Check if a URL is already cached
    pub fn is_cached(&self, url: &Url) -> bool {
        self.path_for(url).is_file()
    }

    /// Download `url` unless it is cached, returning the cache file path
    pub fn fetch_if_missing(
        &self,
        downloader: &impl Downloader,
        url: &Url,
    ) -> Result<PathBuf, CacheError> {
        let path = self.path_for(url);
        if path.is_file() {
            tracing::debug!("{} is cached, skipping download", url);
            return Ok(path);
        }

        fs::create_dir_all(&self.root)?;

        let mut partial = path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);

        tracing::info!("Downloading {}", url);
        if let Err(e) = downloader.download(url, &partial) {
            // Best effort; the download error is what matters.
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        fs::rename(&partial, &path)?;
        Ok(path)
    }

    /// Remove every cached file
    ///
    /// The root directory is recreated empty.
    pub fn purge(&self) -> Result<(), CacheError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        tracing::info!("Purged cache at {}", self.root.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct FakeDownloader {
        calls: Cell<usize>,
        fail: bool,
    }

    impl FakeDownloader {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl Downloader for FakeDownloader {
        fn download(&self, url: &Url, dest: &Path) -> Result<(), FetchError> {
            self.calls.set(self.calls.get() + 1);
            fs::write(dest, url.as_str())?;
            if self.fail {
                return Err(FetchError::HttpStatus {
                    status: 404,
                    url: url.to_string(),
                });
            }
            Ok(())
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/a/b.zip").unwrap()
    }

    #[test]
    fn test_path_for_uses_cache_key() {
        let temp = TempDir::new().unwrap();
        let cache = DownloadCache::new(temp.path());
        assert_eq!(
            cache.path_for(&url()),
            temp.path().join("https%3A%2F%2Fexample.com%2Fa%2Fb.zip")
        );
    }

    #[test]
    fn test_fetch_if_missing_downloads_once() {
        let temp = TempDir::new().unwrap();
        let cache = DownloadCache::new(temp.path().join("cache"));
        let downloader = FakeDownloader::new(false);

        let first = cache.fetch_if_missing(&downloader, &url()).unwrap();
        let second = cache.fetch_if_missing(&downloader, &url()).unwrap();

        assert_eq!(first, second);
        assert_eq!(downloader.calls.get(), 1);
        assert!(cache.is_cached(&url()));
        assert_eq!(fs::read_to_string(first).unwrap(), url().as_str());
    }

    #[test]
    fn test_failed_download_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let cache = DownloadCache::new(temp.path());
        let downloader = FakeDownloader::new(true);

        assert!(cache.fetch_if_missing(&downloader, &url()).is_err());
        assert!(!cache.is_cached(&url()));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_purge_recreates_root() {
        let temp = TempDir::new().unwrap();
        let cache = DownloadCache::new(temp.path().join("cache"));
        cache
            .fetch_if_missing(&FakeDownloader::new(false), &url())
            .unwrap();

        cache.purge().unwrap();
        assert!(cache.root().is_dir());
        assert!(!cache.is_cached(&url()));
    }
}
