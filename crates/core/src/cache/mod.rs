//! On-disk cache for a provisioned tool binary.
//!
//! Each tool gets its own directory below the cache root:
//!
//! ```text
//! ~/.cache/utile/
//!   cloudflared/
//!     cloudflared            # the binary (cloudflared.exe on Windows)
//!     cloudflared.version    # plain-text version marker
//! ```
//!
//! The marker is only ever present when it describes the binary currently on disk:
//! [`CacheStore::write`] removes it before touching the binary and writes it last.
//! The binary itself is replaced by renaming a fully written temp file over it.
//! A crash in between leaves a binary of unknown version, which reads back as
//! [`UNKNOWN_MAJOR_VERSION`] and is therefore considered stale.
//!
//! There is no locking. Concurrent writers race, and whichever runs the full
//! sequence last leaves a consistent binary/marker pair behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::tools::{ToolOptions, UNKNOWN_MAJOR_VERSION, parse_major_version};
use crate::{Error, Result};

/// Cache directory holding one tool binary and its version marker.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    binary_path: PathBuf,
    version_marker_path: PathBuf,
    min_binary_size: u64,
}

impl CacheStore {
    /// Create the store described by `options`.
    ///
    /// Nothing is created on disk until the first [`Self::write`].
    ///
    /// # Errors
    ///
    /// Returns an error if the cache root cannot be determined.
    pub fn new(options: &ToolOptions) -> Result<Self> {
        let dir = options.cache_root()?.join(&options.tool_name);
        let binary_name = options.binary_file_name();
        let binary_path = dir.join(&binary_name);
        let version_marker_path = dir.join(format!("{binary_name}.version"));

        Ok(Self {
            dir,
            binary_path,
            version_marker_path,
            min_binary_size: options.min_binary_size,
        })
    }

    /// Directory holding the cache entry.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cached binary.
    #[must_use]
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Path of the version marker.
    #[must_use]
    pub fn version_marker_path(&self) -> &Path {
        &self.version_marker_path
    }

    /// Whether a usable binary is cached.
    ///
    /// The binary must be a regular file of at least the configured minimum size.
    /// The version marker plays no part.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        match std::fs::metadata(&self.binary_path) {
            Ok(meta) if meta.is_file() => {
                let valid = meta.len() >= self.min_binary_size;
                trace!(path = ?self.binary_path, size = meta.len(), valid, "Checked cached binary");
                valid
            }
            _ => {
                trace!(path = ?self.binary_path, "Cache miss for binary");
                false
            }
        }
    }

    /// Raw contents of the version marker, trimmed.
    #[must_use]
    pub fn read_cached_version(&self) -> Option<String> {
        std::fs::read_to_string(&self.version_marker_path)
            .ok()
            .map(|v| v.trim().to_string())
    }

    /// Major version of the cached binary, or [`UNKNOWN_MAJOR_VERSION`] when the marker
    /// is missing, unreadable or malformed.
    #[must_use]
    pub fn read_cached_major_version(&self) -> i64 {
        self.read_cached_version()
            .map_or(UNKNOWN_MAJOR_VERSION, |v| parse_major_version(&v))
    }

    /// Replace the cached binary and record its version.
    ///
    /// Order: remove the old marker, swap in the binary, write the new marker. The first
    /// I/O failure abandons the sequence, so callers must re-check [`Self::is_cached`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheWrite`] naming the path that failed.
    pub fn write(&self, binary_bytes: &[u8], version: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::cache_write(&self.dir, e))?;

        remove_if_exists(&self.version_marker_path)
            .map_err(|e| Error::cache_write(&self.version_marker_path, e))?;

        self.replace_binary(binary_bytes)
            .map_err(|e| Error::cache_write(&self.binary_path, e))?;

        std::fs::write(&self.version_marker_path, version)
            .map_err(|e| Error::cache_write(&self.version_marker_path, e))?;

        debug!(
            path = ?self.binary_path,
            size = binary_bytes.len(),
            %version,
            "Stored binary in cache"
        );
        Ok(())
    }

    /// Stage the bytes in a sibling temp file and rename it over the binary.
    ///
    /// A running copy of the old binary keeps its inode, and readers never see a
    /// partially written file.
    fn replace_binary(&self, binary_bytes: &[u8]) -> std::io::Result<()> {
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(binary_bytes)?;
        staged.as_file().sync_all()?;
        make_executable(staged.path())?;
        staged.persist(&self.binary_path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Remove the cached binary and its marker. Missing files are fine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheWrite`] if a file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        remove_if_exists(&self.version_marker_path)
            .map_err(|e| Error::cache_write(&self.version_marker_path, e))?;
        remove_if_exists(&self.binary_path).map_err(|e| Error::cache_write(&self.binary_path, e))?;
        debug!(dir = ?self.dir, "Cleared cache entry");
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
