//! Cache keys and mirror rewriting for asset URLs

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Host of direct downloads that may be served from a mirror
pub const GITHUB_HOST: &str = "github.com";

/// Everything except ASCII alphanumerics and `-_.~` is escaped
const CACHE_KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Derive the cache file name of a URL
///
/// The whole URL string is percent-escaped, so the key is a single path
/// component and distinct URLs never share a key.
pub fn cache_key(url: &Url) -> String {
    utf8_percent_encode(url.as_str(), CACHE_KEY_ESCAPE).to_string()
}

/// Check if a URL is an HTTP(S) download from GitHub
pub fn is_github_direct_download_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str() == Some(GITHUB_HOST)
}

/// Rewrite a GitHub download URL onto `mirror`
///
/// The path and query of `asset` are appended to the mirror base. Any other
/// URL is returned unchanged.
pub fn rewrite_for_mirror(asset: &Url, mirror: &Url) -> Url {
    if !is_github_direct_download_url(asset) {
        return asset.clone();
    }

    let mut rewritten = mirror.clone();
    let path = format!("{}{}", mirror.path().trim_end_matches('/'), asset.path());
    rewritten.set_path(&path);
    rewritten.set_query(asset.query());
    rewritten.set_fragment(None);
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_cache_key_is_escaped() {
        let key = cache_key(&url("https://github.com/a/b/releases/download/v1.0.0/b.zip"));
        assert_eq!(
            key,
            "https%3A%2F%2Fgithub.com%2Fa%2Fb%2Freleases%2Fdownload%2Fv1.0.0%2Fb.zip"
        );
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_cache_key_deterministic_and_distinct() {
        let a = url("https://example.com/x?v=1");
        let b = url("https://example.com/x?v=2");
        assert_eq!(cache_key(&a), cache_key(&a.clone()));
        assert_ne!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_github_detection() {
        assert!(is_github_direct_download_url(&url("https://github.com/a/b")));
        assert!(is_github_direct_download_url(&url("http://github.com/a/b")));
        assert!(!is_github_direct_download_url(&url("https://api.github.com/a")));
        assert!(!is_github_direct_download_url(&url("ftp://github.com/a")));
    }

    #[test]
    fn test_rewrite_keeps_path() {
        let asset = url("https://github.com/tooth-hub/x/releases/download/v1.0.0/x.zip?raw=1");
        let mirror = url("https://mirror.example.com/gh/");
        assert_eq!(
            rewrite_for_mirror(&asset, &mirror).as_str(),
            "https://mirror.example.com/gh/tooth-hub/x/releases/download/v1.0.0/x.zip?raw=1"
        );

        let bare_mirror = url("https://mirror.example.com");
        assert_eq!(
            rewrite_for_mirror(&asset, &bare_mirror).as_str(),
            "https://mirror.example.com/tooth-hub/x/releases/download/v1.0.0/x.zip?raw=1"
        );
    }

    #[test]
    fn test_rewrite_passes_other_hosts_through() {
        let asset = url("https://example.com/x.zip");
        let mirror = url("https://mirror.example.com/");
        assert_eq!(rewrite_for_mirror(&asset, &mirror), asset);
    }

    #[test]
    fn test_rewrite_to_default_mirror_is_identity() {
        let asset = url("https://github.com/a/b/archive/v1.zip");
        let mirror = url("https://github.com");
        assert_eq!(rewrite_for_mirror(&asset, &mirror), asset);
    }
}
