//! Provisioning orchestrator.
//!
//! [`Provisioner::ensure`] is the single entry point that makes a tool runnable.
//! It checks, in priority order:
//!
//! 1. the host search path, where a system-managed install always wins
//! 2. the local cache, optionally refreshed when the feed has a newer major version
//! 3. a fresh download into the cache
//!
//! Calling it repeatedly without `allow_update` never downloads twice.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::cache::CacheStore;
use crate::tools::{
    PlatformDescriptor, ReleaseFeed, ReleaseMetadata, ToolLocator, ToolOptions, select_asset,
};
use crate::{Error, Result};

/// How a provisioned tool should be invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Executable {
    /// Bare command name, resolved by the OS at spawn time.
    SearchPath(String),
    /// Absolute path to the cached binary.
    Cached(PathBuf),
}

impl Executable {
    /// Program argument to hand to a process spawner.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        match self {
            Self::SearchPath(name) => OsStr::new(name),
            Self::Cached(path) => path.as_os_str(),
        }
    }
}

impl std::fmt::Display for Executable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SearchPath(name) => write!(f, "{name}"),
            Self::Cached(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Offline snapshot of where a tool would come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionStatus {
    /// Tool name.
    pub tool_name: String,
    /// Resolved location on the search path, if any.
    pub search_path: Option<PathBuf>,
    /// Cached binary location.
    pub binary_path: PathBuf,
    /// Whether the cached binary is usable.
    pub cached: bool,
    /// Contents of the version marker, if present.
    pub cached_version: Option<String>,
}

/// Makes a release-distributed tool available locally.
pub struct Provisioner {
    options: ToolOptions,
    cache: CacheStore,
    platform: PlatformDescriptor,
    feed: Box<dyn ReleaseFeed>,
    locator: Box<dyn ToolLocator>,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("tool", &self.options.tool_name)
            .field("cache", &self.cache.dir())
            .field("platform", &self.platform)
            .field("feed", &self.feed.name())
            .finish()
    }
}

impl Provisioner {
    /// Create a provisioner.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache location cannot be determined.
    pub fn new(
        options: ToolOptions,
        platform: PlatformDescriptor,
        feed: Box<dyn ReleaseFeed>,
        locator: Box<dyn ToolLocator>,
    ) -> Result<Self> {
        let cache = CacheStore::new(&options)?;
        Ok(Self {
            options,
            cache,
            platform,
            feed,
            locator,
        })
    }

    /// The cache this provisioner manages.
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Ensure the tool is available and return how to invoke it.
    ///
    /// # Errors
    ///
    /// Any feed, matching or cache error is returned as-is. A download that leaves the
    /// cache unusable yields [`Error::UpdateFailed`] or [`Error::InitialProvisioningFailed`].
    #[instrument(skip(self), fields(tool = %self.options.tool_name))]
    pub fn ensure(&self, allow_update: bool) -> Result<Executable> {
        let tool = &self.options.tool_name;

        if let Some(path) = self.locator.locate(tool) {
            debug!(?path, "Found tool on search path");
            return Ok(Executable::SearchPath(tool.clone()));
        }

        if self.cache.is_cached() {
            if allow_update {
                self.update_if_outdated()?;
            }
            debug!(path = ?self.cache.binary_path(), "Using cached binary");
            return Ok(Executable::Cached(self.cache.binary_path().to_path_buf()));
        }

        info!(%tool, "Tool not found, downloading latest release");
        let release = self.feed.fetch_latest_release()?;
        self.install(&release)?;
        if !self.cache.is_cached() {
            return Err(Error::InitialProvisioningFailed { tool: tool.clone() });
        }
        Ok(Executable::Cached(self.cache.binary_path().to_path_buf()))
    }

    /// Report the search-path hit and cache state without network access.
    #[must_use]
    pub fn status(&self) -> ProvisionStatus {
        ProvisionStatus {
            tool_name: self.options.tool_name.clone(),
            search_path: self.locator.locate(&self.options.tool_name),
            binary_path: self.cache.binary_path().to_path_buf(),
            cached: self.cache.is_cached(),
            cached_version: self.cache.read_cached_version(),
        }
    }

    /// Compare major versions and re-download when the feed is ahead.
    fn update_if_outdated(&self) -> Result<()> {
        let local = self.cache.read_cached_major_version();
        let release = self.feed.fetch_latest_release()?;
        let remote = release.major_version();

        if remote <= local {
            debug!(local, remote, "Cached binary is current");
            return Ok(());
        }

        info!(
            tool = %self.options.tool_name,
            local,
            remote,
            version = %release.version,
            "Cached binary is outdated, updating"
        );
        self.install(&release)?;
        if !self.cache.is_cached() {
            return Err(Error::UpdateFailed {
                tool: self.options.tool_name.clone(),
            });
        }
        Ok(())
    }

    /// Select, download and store the asset for this platform.
    fn install(&self, release: &ReleaseMetadata) -> Result<()> {
        let asset = select_asset(&release.assets, &self.platform)?;
        info!(url = %asset.download_url, version = %release.version, "Downloading release asset");
        let bytes = self.feed.download_asset(&asset)?;
        self.cache.write(&bytes, &release.version)
    }

    /// Path the cached binary would live at.
    #[must_use]
    pub fn cached_binary_path(&self) -> &Path {
        self.cache.binary_path()
    }
}
