//! `utile cloudflared ...` commands.

use tracing::{debug, instrument};
use utile_core::provision::{Executable, ProvisionStatus, Provisioner};
use utile_core::tools::{SearchPath, ToolOptions, describe_platform_with};
use utile_core::{Result, invoke};
use utile_tools_github::GitHubReleaseFeed;

use super::ToolContext;
use crate::errors::CliError;

pub const TOOL_NAME: &str = "cloudflared";

/// Build a provisioner for cloudflared backed by GitHub Releases and the host `PATH`.
fn provisioner(context: &ToolContext) -> Result<Provisioner> {
    let mut options = ToolOptions::new(TOOL_NAME);
    if let Some(dir) = &context.cache_dir {
        options = options.with_cache_dir(dir.clone());
    }

    Provisioner::new(
        options,
        describe_platform_with(context.platform.as_deref(), context.arch.as_deref())?,
        Box::new(GitHubReleaseFeed::cloudflared()?),
        Box::new(SearchPath),
    )
}

/// Ensure cloudflared is available and return how to invoke it.
#[instrument]
pub fn ensure(update: bool, context: &ToolContext) -> Result<Executable> {
    provisioner(context)?.ensure(update)
}

/// Open a quick tunnel to `url`.
#[instrument]
pub fn tunnel(url: &str, update: bool, context: &ToolContext) -> miette::Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CliError::invalid_argument("--url", "must not be empty").into());
    }

    let executable = ensure(update, context)?;
    debug!(%executable, %url, "Starting tunnel");
    invoke::run(&executable, ["tunnel", "--url", url])?;
    Ok(())
}

/// Run cloudflared with caller-supplied arguments.
#[instrument]
pub fn run(args: &[String], update: bool, context: &ToolContext) -> Result<()> {
    let executable = ensure(update, context)?;
    invoke::run(&executable, args)
}

/// Offline report of where cloudflared would come from.
pub fn status(context: &ToolContext) -> Result<String> {
    Ok(format_status(&provisioner(context)?.status()))
}

/// Remove the cached binary and its version marker.
pub fn clean(context: &ToolContext) -> Result<String> {
    let provisioner = provisioner(context)?;
    let cache = provisioner.cache();
    cache.clear()?;
    Ok(format!(
        "Removed cached {TOOL_NAME} from {}",
        cache.dir().display()
    ))
}

fn format_status(status: &ProvisionStatus) -> String {
    let search_path = status
        .search_path
        .as_ref()
        .map_or_else(|| "not found".to_string(), |p| p.display().to_string());
    let cache_state = if status.cached { "usable" } else { "missing" };
    let cached_version = status.cached_version.as_deref().unwrap_or("unknown");

    format!(
        "Tool: {}\n\
        Search path: {search_path}\n\
        Cached binary: {} ({cache_state})\n\
        Cached version: {cached_version}",
        status.tool_name,
        status.binary_path.display(),
    )
}
