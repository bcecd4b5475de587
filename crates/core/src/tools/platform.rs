//! Host platform identification.
//!
//! Release artifacts name architectures the Go way (`amd64`, `arm64`, `386`), so the
//! Rust target architecture is mapped onto those names before matching.
//!
//! The architecture therefore differs from the raw `uname -m` value (`x86_64` becomes `amd64`).

use std::sync::OnceLock;

use crate::{Error, Result};

/// Operating system family, as far as asset matching cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Windows,
    Linux,
    Other,
}

impl OsFamily {
    /// Classify a platform identification string (e.g. "windows", "Linux-6.1-x86_64").
    #[must_use]
    pub fn from_platform_string(platform: &str) -> Self {
        let platform = platform.to_lowercase();
        if platform.contains("windows") {
            Self::Windows
        } else if platform.contains("linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Linux => write!(f, "linux"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Host OS family and CPU architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformDescriptor {
    pub os_family: OsFamily,
    pub arch: String,
}

impl PlatformDescriptor {
    /// Create a descriptor from known parts.
    #[must_use]
    pub fn new(os_family: OsFamily, arch: impl Into<String>) -> Self {
        Self {
            os_family,
            arch: arch.into(),
        }
    }

    /// Build a descriptor from a platform identification string and an architecture string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownArchitecture`] when `arch` is empty.
    pub fn from_identifiers(platform: &str, arch: &str) -> Result<Self> {
        let arch = arch.trim();
        if arch.is_empty() {
            return Err(Error::UnknownArchitecture);
        }
        Ok(Self::new(OsFamily::from_platform_string(platform), arch))
    }

    fn detect() -> Result<Self> {
        Self::from_identifiers(std::env::consts::OS, normalize_arch(std::env::consts::ARCH))
    }
}

impl std::fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os_family, self.arch)
    }
}

static CURRENT: OnceLock<Option<PlatformDescriptor>> = OnceLock::new();

/// Describe the host platform. Computed once per process.
///
/// # Errors
///
/// Returns [`Error::UnknownArchitecture`] if the host architecture string is empty.
pub fn describe_platform() -> Result<PlatformDescriptor> {
    CURRENT
        .get_or_init(|| PlatformDescriptor::detect().ok())
        .clone()
        .ok_or(Error::UnknownArchitecture)
}

/// Describe the host, with explicit platform and architecture strings taking precedence.
///
/// With neither override this is [`describe_platform`]. A missing piece falls back to
/// the host value. Architectures are mapped onto release-artifact naming either way.
///
/// # Errors
///
/// Returns [`Error::UnknownArchitecture`] if the resulting architecture is empty.
pub fn describe_platform_with(
    platform: Option<&str>,
    arch: Option<&str>,
) -> Result<PlatformDescriptor> {
    if platform.is_none() && arch.is_none() {
        return describe_platform();
    }
    PlatformDescriptor::from_identifiers(
        platform.unwrap_or(std::env::consts::OS),
        normalize_arch(arch.unwrap_or(std::env::consts::ARCH).trim()),
    )
}

/// Map a Rust target architecture onto release-artifact naming.
fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}
