//! Integration tests for provisioning across process-like boundaries
//!
//! Each test builds fresh `Provisioner`/`CacheStore` instances over the same cache
//! root, the way separate `utile` invocations would.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;
use utile_core::cache::CacheStore;
use utile_core::provision::{Executable, Provisioner};
use utile_core::tools::{
    OsFamily, PlatformDescriptor, ReleaseAsset, ReleaseFeed, ReleaseMetadata, ToolLocator,
    ToolOptions,
};
use utile_core::{Error, Result};

const RELEASE_BASE: &str = "https://github.com/cloudflare/cloudflared/releases/download";

struct StaticFeed {
    version: &'static str,
    downloads: Arc<AtomicUsize>,
}

impl ReleaseFeed for StaticFeed {
    fn name(&self) -> &'static str {
        "static"
    }

    fn fetch_latest_release(&self) -> Result<ReleaseMetadata> {
        let assets = [
            "cloudflared-darwin-amd64.tgz",
            "cloudflared-linux-amd64",
            "cloudflared-linux-arm64",
            "cloudflared-windows-amd64.exe",
            "cloudflared-windows-386.exe",
            "cloudflared-linux-x86_64.rpm",
        ];
        Ok(ReleaseMetadata {
            version: self.version.to_string(),
            assets: assets
                .iter()
                .map(|name| ReleaseAsset::from_url(format!("{RELEASE_BASE}/{}/{name}", self.version)))
                .collect(),
        })
    }

    fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(asset.download_url.as_bytes().repeat(8))
    }
}

struct NotOnPath;

impl ToolLocator for NotOnPath {
    fn locate(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

fn options(cache: &TempDir) -> ToolOptions {
    ToolOptions::new("cloudflared").with_cache_dir(cache.path().to_path_buf())
}

fn provisioner(
    cache: &TempDir,
    platform: PlatformDescriptor,
    version: &'static str,
    downloads: &Arc<AtomicUsize>,
) -> Provisioner {
    Provisioner::new(
        options(cache),
        platform,
        Box::new(StaticFeed {
            version,
            downloads: Arc::clone(downloads),
        }),
        Box::new(NotOnPath),
    )
    .unwrap()
}

#[test]
fn test_cache_survives_new_instances() {
    let cache = TempDir::new().unwrap();
    let downloads = Arc::new(AtomicUsize::new(0));
    let linux = PlatformDescriptor::new(OsFamily::Linux, "amd64");

    let first = provisioner(&cache, linux.clone(), "2024.12.2", &downloads)
        .ensure(false)
        .unwrap();
    let second = provisioner(&cache, linux, "2025.1.0", &downloads)
        .ensure(false)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(downloads.load(Ordering::SeqCst), 1);

    let store = CacheStore::new(&options(&cache)).unwrap();
    assert_eq!(store.read_cached_version().as_deref(), Some("2024.12.2"));
}

#[test]
fn test_update_across_instances() {
    let cache = TempDir::new().unwrap();
    let downloads = Arc::new(AtomicUsize::new(0));
    let linux = PlatformDescriptor::new(OsFamily::Linux, "arm64");

    provisioner(&cache, linux.clone(), "2024.12.2", &downloads)
        .ensure(false)
        .unwrap();
    provisioner(&cache, linux.clone(), "2024.12.9", &downloads)
        .ensure(true)
        .unwrap();
    assert_eq!(downloads.load(Ordering::SeqCst), 1);

    let exe = provisioner(&cache, linux, "2025.1.0", &downloads)
        .ensure(true)
        .unwrap();
    assert_eq!(downloads.load(Ordering::SeqCst), 2);

    let Executable::Cached(path) = exe else {
        panic!("expected a cached binary");
    };
    let contents = String::from_utf8(std::fs::read(path).unwrap()).unwrap();
    assert!(contents.contains("2025.1.0/cloudflared-linux-arm64"));
}

#[test]
fn test_windows_selects_exe() {
    let cache = TempDir::new().unwrap();
    let downloads = Arc::new(AtomicUsize::new(0));

    let p = provisioner(
        &cache,
        PlatformDescriptor::new(OsFamily::Windows, "386"),
        "2024.12.2",
        &downloads,
    );
    p.ensure(false).unwrap();

    let contents = String::from_utf8(std::fs::read(p.cached_binary_path()).unwrap()).unwrap();
    assert!(contents.contains("cloudflared-windows-386.exe"));
}

#[test]
fn test_unknown_arch_has_no_asset() {
    let cache = TempDir::new().unwrap();
    let downloads = Arc::new(AtomicUsize::new(0));

    let err = provisioner(
        &cache,
        PlatformDescriptor::new(OsFamily::Linux, "riscv64"),
        "2024.12.2",
        &downloads,
    )
    .ensure(false)
    .unwrap_err();

    match err {
        Error::NoCompatibleAsset { candidates, .. } => {
            assert!(candidates.contains(&"cloudflared-linux-amd64".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(downloads.load(Ordering::SeqCst), 0);
}
