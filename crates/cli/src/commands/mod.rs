pub mod cloudflared;
pub mod version;

use std::path::PathBuf;

/// Where and for which platform a tool is provisioned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolContext {
    pub cache_dir: Option<PathBuf>,
    pub platform: Option<String>,
    pub arch: Option<String>,
}

/// A parsed, validated CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    Tunnel {
        url: String,
        update: bool,
        context: ToolContext,
    },
    Run {
        args: Vec<String>,
        update: bool,
        context: ToolContext,
    },
    Ensure {
        update: bool,
        context: ToolContext,
    },
    Status {
        context: ToolContext,
    },
    Clean {
        context: ToolContext,
    },
}
