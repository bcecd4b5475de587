//! Platform-appropriate locations for utile data.
//!
//! | Platform | Cache Dir |
//! |----------|-----------|
//! | **macOS** | `~/Library/Caches/utile` |
//! | **Linux** | `~/.cache/utile` (XDG_CACHE_HOME) |
//! | **Windows** | `%LOCALAPPDATA%\utile` |
//!
//! `UTILE_CACHE_DIR` overrides the cache root for testing and CI.

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable that overrides the cache root.
pub const CACHE_DIR_ENV: &str = "UTILE_CACHE_DIR";

/// Get the cache root for utile.
///
/// Every provisioned tool gets its own subdirectory below this root.
///
/// Resolution order:
/// 1. `UTILE_CACHE_DIR` environment variable
/// 2. Platform cache directory + `/utile`
///
/// # Errors
///
/// Returns an error if the cache directory cannot be determined.
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let base = dirs::cache_dir()
        .ok_or_else(|| Error::configuration("Could not determine cache directory"))?;

    Ok(base.join("utile"))
}
