//! Release metadata and platform asset selection.

use tracing::debug;

use super::platform::{OsFamily, PlatformDescriptor};
use crate::{Error, Result};

/// Major version reported when a version string cannot be parsed.
pub const UNKNOWN_MAJOR_VERSION: i64 = -1;

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    /// Direct download URL.
    pub download_url: String,
    /// Final path segment without its extension.
    pub filename: String,
    /// Lower-cased text after the final `.` of the last path segment.
    pub extension: String,
}

impl ReleaseAsset {
    /// Derive an asset from its download URL.
    ///
    /// The last path segment is split on its final `.`. A segment without a dot is used
    /// whole as both stem and extension, so bare binaries like `cloudflared-linux-amd64`
    /// still carry their OS and architecture tokens in the extension.
    #[must_use]
    pub fn from_url(download_url: impl Into<String>) -> Self {
        let download_url = download_url.into();
        let segment = download_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        let (filename, extension) = match segment.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), ext.to_lowercase()),
            None => (segment.to_string(), segment.to_lowercase()),
        };

        Self {
            download_url,
            filename,
            extension,
        }
    }

    /// Whether this asset runs on `platform`.
    #[must_use]
    pub fn matches(&self, platform: &PlatformDescriptor) -> bool {
        let arch = platform.arch.to_lowercase();
        match platform.os_family {
            OsFamily::Windows => {
                self.extension == "exe" && self.filename.to_lowercase().contains(&arch)
            }
            OsFamily::Linux => self.extension.contains("linux") && self.extension.contains(&arch),
            OsFamily::Other => false,
        }
    }

    /// Display name of the asset (stem plus extension when they differ).
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.filename.eq_ignore_ascii_case(&self.extension) {
            self.filename.clone()
        } else {
            format!("{}.{}", self.filename, self.extension)
        }
    }
}

/// The latest release as published by a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    /// Version identifier, expected as `MAJOR.MINOR.PATCH`.
    pub version: String,
    /// Assets in feed order.
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseMetadata {
    /// Major component of [`Self::version`], or [`UNKNOWN_MAJOR_VERSION`].
    #[must_use]
    pub fn major_version(&self) -> i64 {
        parse_major_version(&self.version)
    }
}

/// Parse the major component of a `MAJOR.MINOR.PATCH` version.
///
/// Surrounding whitespace and a leading `v` are ignored. Anything that is not exactly
/// three dot-separated components with an integer major yields [`UNKNOWN_MAJOR_VERSION`].
#[must_use]
pub fn parse_major_version(version: &str) -> i64 {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != 3 {
        return UNKNOWN_MAJOR_VERSION;
    }
    parts[0].parse().unwrap_or(UNKNOWN_MAJOR_VERSION)
}

/// Select the first asset in feed order that runs on `platform`.
///
/// # Errors
///
/// Returns [`Error::NoCompatibleAsset`] when nothing matches, including always on
/// [`OsFamily::Other`].
pub fn select_asset(assets: &[ReleaseAsset], platform: &PlatformDescriptor) -> Result<ReleaseAsset> {
    if platform.os_family != OsFamily::Other
        && let Some(asset) = assets.iter().find(|a| a.matches(platform))
    {
        debug!(%platform, url = %asset.download_url, "Selected release asset");
        return Ok(asset.clone());
    }

    Err(Error::NoCompatibleAsset {
        platform: platform.clone(),
        candidates: assets.iter().map(ReleaseAsset::display_name).collect(),
    })
}
