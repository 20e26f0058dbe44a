//! Module proxy URLs
//!
//! Teeth hosted as Go-style modules are downloaded through a module proxy
//! (`GOPROXY` protocol). Paths are validated and case-escaped the way the
//! proxy protocol requires before being joined onto the proxy base URL.

use crate::semver::Version;
use thiserror::Error;
use url::Url;

/// Errors that can occur while building proxy URLs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Not a valid module path
    #[error("Invalid module path {path}: {reason}")]
    InvalidModulePath { path: String, reason: String },

    /// Proxy archives only exist for canonical versions
    #[error("Cannot build archive name for version with build metadata: {0}")]
    BuildMetadata(String),

    /// Joined URL failed to parse
    #[error("Invalid URL: {0}")]
    Parse(#[from] url::ParseError),
}

const WINDOWS_RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Check that `path` is a valid module path
pub fn check_module_path(path: &str) -> Result<(), UrlError> {
    let fail = |reason: &str| UrlError::InvalidModulePath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(fail("empty path"));
    }
    if path.starts_with('-') {
        return Err(fail("leading dash"));
    }
    if path.contains("//") {
        return Err(fail("double slash"));
    }
    if path.ends_with('/') {
        return Err(fail("trailing slash"));
    }

    for element in path.split('/') {
        check_element(element).map_err(fail)?;
    }

    let first = path.split('/').next().unwrap_or_default();
    if !first.contains('.') {
        return Err(fail("missing dot in first path element"));
    }
    if first.starts_with('-') {
        return Err(fail("leading dash in first path element"));
    }
    if let Some(c) = first
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.')))
    {
        return Err(fail(&format!("invalid char {:?} in first path element", c)));
    }

    check_major_suffix(path).map_err(fail)
}

fn check_element(element: &str) -> Result<(), &'static str> {
    if element.is_empty() {
        return Err("empty path element");
    }
    if element.chars().all(|c| c == '.') {
        return Err("invalid path element");
    }
    if element.starts_with('.') {
        return Err("leading dot in path element");
    }
    if element.ends_with('.') {
        return Err("trailing dot in path element");
    }
    if !element
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    {
        return Err("invalid char in path element");
    }

    let short = element.split('.').next().unwrap_or(element);
    if WINDOWS_RESERVED
        .iter()
        .any(|name| short.eq_ignore_ascii_case(name))
    {
        return Err("disallowed path element");
    }

    if let Some((_, suffix)) = element.rsplit_once('~') {
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            return Err("trailing tilde and digits in path element");
        }
    }

    Ok(())
}

/// A trailing `/vN` element must name a major version of 2 or more
fn check_major_suffix(path: &str) -> Result<(), &'static str> {
    let last = path.rsplit('/').next().unwrap_or_default();
    if path == last {
        return Ok(());
    }

    match last.strip_prefix('v') {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            if digits.starts_with('0') || digits == "1" {
                Err("invalid major version suffix")
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

/// Escape a module path for use in proxy URLs
///
/// Upper-case letters become `!` followed by the lower-case letter.
pub fn escape_module_path(path: &str) -> Result<String, UrlError> {
    check_module_path(path)?;

    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    Ok(escaped)
}

/// URL of the version list of a module: `<proxy>/<path>/@v/list`
pub fn version_list_url(module_path: &str, proxy: &Url) -> Result<Url, UrlError> {
    let escaped = escape_module_path(module_path)?;
    join(proxy, &format!("{}/@v/list", escaped))
}

/// URL of the zip archive of a module version: `<proxy>/<path>/@v/v<version>.zip`
///
/// Major versions of 2 or more are not Go modules of their own and carry the
/// `+incompatible` suffix.
pub fn module_zip_url(module_path: &str, version: &Version, proxy: &Url) -> Result<Url, UrlError> {
    let file_name = zip_file_name(version)?;
    let escaped = escape_module_path(module_path)?;
    join(proxy, &format!("{}/@v/{}", escaped, file_name))
}

fn zip_file_name(version: &Version) -> Result<String, UrlError> {
    if version.build.is_some() {
        return Err(UrlError::BuildMetadata(version.to_string()));
    }

    if version.major >= 2 {
        Ok(format!("v{}+incompatible.zip", version))
    } else {
        Ok(format!("v{}.zip", version))
    }
}

/// Join a relative path below the proxy base, whose path may lack a trailing slash
fn join(base: &Url, relative: &str) -> Result<Url, UrlError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(relative)?)
}
