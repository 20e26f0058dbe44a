//! Resource locations
//!
//! Pure URL derivations (cache keys, mirror rewriting, module proxy URLs) and
//! the I/O side that uses them (HTTP fetching and the download cache).
//!
//! ## Cache structure
//!
//! Downloads are cached flat in `~/.lip/cache/`, one file per URL:
//! ```text
//! ~/.lip/cache/
//! ├── https%3A%2F%2Fgithub.com%2F...%2Fx.zip
//! └── https%3A%2F%2Fgoproxy.io%2F...%2F%40v%2Fv1.0.0.zip
//! ```

pub mod cache;
pub mod fetch;
pub mod locator;
pub mod proxy;

pub use cache::{CacheError, DownloadCache};
pub use fetch::{
    Downloader, FetchError, FetchResult, UrlFetcher, MAX_CONTENT_SIZE, REQUEST_TIMEOUT,
};
pub use locator::{cache_key, is_github_direct_download_url, rewrite_for_mirror, GITHUB_HOST};
pub use proxy::{
    check_module_path, escape_module_path, module_zip_url, version_list_url, UrlError,
};
