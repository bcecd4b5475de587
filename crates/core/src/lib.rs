//! Core types and provisioning logic for utile.
//!
//! utile runs external command-line tools that are published as platform-specific
//! release binaries. This crate decides whether a usable copy of such a tool already
//! exists (on the search path or in the local cache), keeps the cached copy current,
//! and installs the right binary for the host when needed.
//!
//! Network access lives behind the [`tools::ReleaseFeed`] trait so provider crates
//! (e.g. `utile-tools-github`) can plug in their own release sources.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub mod cache;
pub mod invoke;
pub mod paths;
pub mod provision;
pub mod tools;

pub use tools::PlatformDescriptor;

/// Main error type for utile operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(utile::config))]
    Configuration(String),

    #[error("Could not reach the release feed at {url}: {message}")]
    #[diagnostic(
        code(utile::feed::unreachable),
        help("Check your network connection and proxy settings")
    )]
    FeedUnreachable { url: String, message: String },

    #[error("Release feed request to {url} failed with HTTP {status_code}")]
    #[diagnostic(
        code(utile::feed::request),
        help("Set GITHUB_TOKEN if you are hitting API rate limits")
    )]
    FeedRequest { url: String, status_code: u16 },

    #[error("Could not parse the release feed response from {url}: {message}")]
    #[diagnostic(code(utile::feed::malformed))]
    FeedResponseMalformed { url: String, message: String },

    #[error("Failed to download release asset {url}: {message}")]
    #[diagnostic(code(utile::feed::download))]
    AssetDownload { url: String, message: String },

    #[error("No release asset is compatible with {platform} (candidates: {})", candidates.join(", "))]
    #[diagnostic(
        code(utile::asset::incompatible),
        help("Only Windows and Linux single-file executables are supported")
    )]
    NoCompatibleAsset {
        platform: PlatformDescriptor,
        candidates: Vec<String>,
    },

    #[error("Failed to write cache file {}", path.display())]
    #[diagnostic(
        code(utile::cache::write),
        help("Check permissions on the cache directory or set UTILE_CACHE_DIR")
    )]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Updating {tool} left the cache without a usable binary")]
    #[diagnostic(code(utile::provision::update_failed))]
    UpdateFailed { tool: String },

    #[error("Downloading {tool} did not produce a usable binary")]
    #[diagnostic(code(utile::provision::initial_failed))]
    InitialProvisioningFailed { tool: String },

    #[error("{program} exited with {}", exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    #[diagnostic(code(utile::command::exit))]
    ExternalCommand {
        program: String,
        exit_code: Option<i32>,
    },

    #[error("Failed to start {program}")]
    #[diagnostic(code(utile::command::spawn))]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Host CPU architecture cannot be determined")]
    #[diagnostic(code(utile::platform::arch))]
    UnknownArchitecture,
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn feed_unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FeedUnreachable {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn feed_malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FeedResponseMalformed {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn asset_download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssetDownload {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn cache_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheWrite {
            path: path.into(),
            source,
        }
    }

    /// Exit code to report when this error ends the process.
    ///
    /// External command failures pass the child's code through; everything else is 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ExternalCommand {
                exit_code: Some(code),
                ..
            } => *code,
            _ => 1,
        }
    }
}

/// Result type alias for utile operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::OsFamily;

    #[test]
    fn test_no_compatible_asset_lists_candidates() {
        let err = Error::NoCompatibleAsset {
            platform: PlatformDescriptor::new(OsFamily::Windows, "amd64"),
            candidates: vec!["cloudflared-linux-amd64".into(), "cloudflared.msi".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("windows-amd64"));
        assert!(msg.contains("cloudflared-linux-amd64, cloudflared.msi"));
    }

    #[test]
    fn test_external_command_message() {
        let err = Error::ExternalCommand {
            program: "cloudflared".into(),
            exit_code: Some(3),
        };
        assert_eq!(err.to_string(), "cloudflared exited with code 3");
        assert_eq!(err.exit_code(), 3);

        let killed = Error::ExternalCommand {
            program: "cloudflared".into(),
            exit_code: None,
        };
        assert_eq!(killed.to_string(), "cloudflared exited with a signal");
        assert_eq!(killed.exit_code(), 1);
    }

    #[test]
    fn test_feed_request_exit_code() {
        let err = Error::FeedRequest {
            url: "https://api.github.com".into(),
            status_code: 403,
        };
        assert!(err.to_string().contains("HTTP 403"));
        assert_eq!(err.exit_code(), 1);
    }
}
