//! Target platform identification
//!
//! Tooth manifests name platforms the way Go does (`GOOS`/`GOARCH`), so the
//! Rust target constants are translated into those names.

use std::fmt;

/// An operating system and CPU architecture pair, e.g. `linux/amd64`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this process is running on
    pub fn current() -> Self {
        Self::new(
            go_os_name(std::env::consts::OS),
            go_arch_name(std::env::consts::ARCH),
        )
    }

    /// Check an `os`/`arch` applicability filter; empty fields match anything
    pub fn matches(&self, os: &str, arch: &str) -> bool {
        (os.is_empty() || os == self.os) && (arch.is_empty() || arch == self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn go_os_name(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn go_arch_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_names() {
        assert_eq!(go_os_name("macos"), "darwin");
        assert_eq!(go_os_name("linux"), "linux");
        assert_eq!(go_arch_name("x86_64"), "amd64");
        assert_eq!(go_arch_name("aarch64"), "arm64");
        assert_eq!(go_arch_name("x86"), "386");
    }

    #[test]
    fn test_matches_filters() {
        let p = Platform::new("linux", "amd64");
        assert!(p.matches("", ""));
        assert!(p.matches("linux", ""));
        assert!(p.matches("linux", "amd64"));
        assert!(p.matches("", "amd64"));
        assert!(!p.matches("windows", ""));
        assert!(!p.matches("linux", "arm64"));
    }

    #[test]
    fn test_current_is_populated() {
        let p = Platform::current();
        assert!(!p.os.is_empty());
        assert!(!p.arch.is_empty());
        assert_ne!(p.os, "macos");
    }
}
