//! Seams between the orchestrator and the outside world.
//!
//! The orchestrator only talks to the network through [`ReleaseFeed`] and to the
//! search path through [`ToolLocator`], so both can be replaced in tests.

use std::path::PathBuf;

use super::release::{ReleaseAsset, ReleaseMetadata};
use crate::Result;

/// Minimum size in bytes for a cached binary to count as usable.
///
/// Anything smaller is treated as a truncated or failed download.
pub const DEFAULT_MIN_BINARY_SIZE: u64 = 100;

/// A remote source of release binaries.
///
/// Implementations perform blocking I/O and hold no connection between calls.
pub trait ReleaseFeed: Send + Sync {
    /// Provider name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Fetch metadata for the latest release.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FeedUnreachable`], [`crate::Error::FeedRequest`] or
    /// [`crate::Error::FeedResponseMalformed`].
    fn fetch_latest_release(&self) -> Result<ReleaseMetadata>;

    /// Download the bytes of a release asset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AssetDownload`] if the transfer fails.
    fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>>;
}

/// Locates executables by name without an explicit path.
pub trait ToolLocator: Send + Sync {
    /// Resolve `name` to an executable, if the host can find one.
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// The host's executable search path (`PATH`, plus `PATHEXT` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPath;

impl ToolLocator for SearchPath {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Configuration for a provisioned tool.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    /// Command name, also used for the cache subdirectory and binary file name.
    pub tool_name: String,
    /// Custom cache root. Defaults to [`crate::paths::cache_dir`].
    pub cache_dir: Option<PathBuf>,
    /// Smallest binary size accepted as a valid cache entry.
    pub min_binary_size: u64,
}

impl ToolOptions {
    /// Create options for `tool_name` with the default cache root.
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            cache_dir: None,
            min_binary_size: DEFAULT_MIN_BINARY_SIZE,
        }
    }

    /// Set the cache root.
    #[must_use]
    pub fn with_cache_dir(mut self, path: PathBuf) -> Self {
        self.cache_dir = Some(path);
        self
    }

    /// Set the minimum accepted binary size.
    #[must_use]
    pub fn with_min_binary_size(mut self, size: u64) -> Self {
        self.min_binary_size = size;
        self
    }

    /// Get the cache root, defaulting to the platform cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no cache root is configured and none can be determined.
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::paths::cache_dir(),
        }
    }

    /// File name of the tool's binary on this host.
    #[must_use]
    pub fn binary_file_name(&self) -> String {
        format!("{}{}", self.tool_name, std::env::consts::EXE_SUFFIX)
    }
}
