//! HTTP downloads
//!
//! Handles downloading tooth archives and proxy version lists over HTTP/HTTPS.

use reqwest::blocking::Client;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL fetching
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Only http and https can be fetched
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Content too large
    #[error("Content too large: {size} bytes (max: {max})")]
    ContentTooLarge { size: u64, max: u64 },
}

/// Maximum size of a single download (512 MB)
pub const MAX_CONTENT_SIZE: u64 = 512 * 1024 * 1024;

/// HTTP client configuration
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Result of fetching a URL
#[derive(Debug)]
pub struct FetchResult {
    /// Content bytes
    pub content: Vec<u8>,
    /// Content type (if provided by server)
    pub content_type: Option<String>,
    /// Final URL (after redirects)
    pub final_url: String,
}

/// Something that can store the resource at a URL into a file
///
/// [`DownloadCache`](super::DownloadCache) only talks to the network through
/// this trait.
pub trait Downloader {
    fn download(&self, url: &Url, dest: &Path) -> Result<(), FetchError>;
}

/// Blocking HTTP fetcher
pub struct UrlFetcher {
    client: Client,
    max_size: u64,
}

impl UrlFetcher {
    /// Create a fetcher that connects directly
    pub fn new() -> Result<Self, FetchError> {
        Self::with_proxy(None)
    }

    /// Create a fetcher that routes every request through `proxy`, if given
    pub fn with_proxy(proxy: Option<&Url>) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("lip/{}", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = proxy {
            tracing::debug!("Using HTTP proxy {}", proxy);
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        Ok(Self {
            client: builder.build()?,
            max_size: MAX_CONTENT_SIZE,
        })
    }

    /// Limit the size of fetched content
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Fetch content from a URL
    pub fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(url.to_string()));
        }

        tracing::debug!("GET {}", url);
        let response = self.client.get(url.as_str()).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_size {
                return Err(FetchError::ContentTooLarge {
                    size: len,
                    max: self.max_size,
                });
            }
        }

        // Get metadata before consuming response
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let final_url = response.url().to_string();

        // Read content with size limit
        let mut content = Vec::new();
        let mut reader = response.take(self.max_size + 1);
        reader.read_to_end(&mut content)?;

        if content.len() as u64 > self.max_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len() as u64,
                max: self.max_size,
            });
        }

        Ok(FetchResult {
            content,
            content_type,
            final_url,
        })
    }

    /// Fetch a text body, replacing invalid UTF-8
    pub fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let result = self.fetch(url)?;
        Ok(String::from_utf8_lossy(&result.content).into_owned())
    }

    /// Fetch and save to a file
    pub fn fetch_to_file(&self, url: &Url, dest: &Path) -> Result<FetchResult, FetchError> {
        let result = self.fetch(url)?;

        // Ensure parent directory exists
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(dest, &result.content)?;

        Ok(result)
    }
}

impl Downloader for UrlFetcher {
    fn download(&self, url: &Url, dest: &Path) -> Result<(), FetchError> {
        self.fetch_to_file(url, dest).map(|_| ())
    }
}
