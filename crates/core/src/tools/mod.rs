//! Release-binary tool model.
//!
//! # Architecture
//!
//! - [`PlatformDescriptor`], [`OsFamily`] - host identification, computed once per process
//! - [`ReleaseAsset`], [`ReleaseMetadata`] - what a release feed publishes
//! - [`select_asset`] - picks the single asset that runs on the host
//! - [`ReleaseFeed`] - trait implemented by release sources (GitHub, ...)
//! - [`ToolLocator`] - search-path lookup, [`SearchPath`] being the real one
//! - [`ToolOptions`] - explicit configuration for the cache and orchestrator
//!
//! # Example
//!
//! ```ignore
//! use utile_core::tools::{ReleaseFeed, describe_platform, select_asset};
//! use utile_tools_github::GitHubReleaseFeed;
//!
//! let feed = GitHubReleaseFeed::new("cloudflare", "cloudflared")?;
//! let release = feed.fetch_latest_release()?;
//! let asset = select_asset(&release.assets, &describe_platform()?)?;
//! ```

mod platform;
mod provider;
mod release;

pub use platform::{OsFamily, PlatformDescriptor, describe_platform, describe_platform_with};
pub use provider::{
    DEFAULT_MIN_BINARY_SIZE, ReleaseFeed, SearchPath, ToolLocator, ToolOptions,
};
pub use release::{
    ReleaseAsset, ReleaseMetadata, UNKNOWN_MAJOR_VERSION, parse_major_version, select_asset,
};
