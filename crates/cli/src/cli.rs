use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use utile_core::paths::CACHE_DIR_ENV;

use crate::commands::{Command, ToolContext};
use crate::tracing::{LogLevel, TracingFormat};

#[derive(Parser, Debug)]
#[command(name = "utile")]
#[command(about = "Provision and run release-distributed command-line tools")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(long, global = true, help = "Log output format", value_enum)]
    pub format: Option<TracingFormat>,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,
}

impl Cli {
    /// Log format, with `--json` taking precedence over `--format`.
    pub fn tracing_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.format.clone().unwrap_or(TracingFormat::Compact)
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Show version information")]
    Version,
    #[command(about = "Manage and run Cloudflare's cloudflared")]
    Cloudflared {
        #[command(flatten)]
        tool: ToolArgs,
        #[command(subcommand)]
        subcommand: CloudflaredCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    #[arg(
        long,
        global = true,
        env = CACHE_DIR_ENV,
        help = "Directory to cache downloaded binaries in"
    )]
    pub cache_dir: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Platform to provision for instead of the host (e.g. linux, windows)"
    )]
    pub platform: Option<String>,

    #[arg(
        long,
        global = true,
        help = "CPU architecture to provision for instead of the host (e.g. amd64, arm64)"
    )]
    pub arch: Option<String>,
}

impl From<ToolArgs> for ToolContext {
    fn from(args: ToolArgs) -> Self {
        Self {
            cache_dir: args.cache_dir,
            platform: args.platform,
            arch: args.arch,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CloudflaredCommands {
    #[command(about = "Expose a local URL through a quick tunnel")]
    Tunnel {
        #[arg(long, help = "Local URL to expose, e.g. http://localhost:8080")]
        url: String,
        #[arg(long, help = "Refresh the cached binary if a newer major version exists")]
        update: bool,
    },
    #[command(about = "Run cloudflared with arbitrary arguments")]
    Run {
        #[arg(long, help = "Refresh the cached binary if a newer major version exists")]
        update: bool,
        #[arg(last = true, help = "Arguments passed to cloudflared")]
        args: Vec<String>,
    },
    #[command(about = "Make cloudflared available and print how to invoke it")]
    Ensure {
        #[arg(long, help = "Refresh the cached binary if a newer major version exists")]
        update: bool,
    },
    #[command(about = "Show where cloudflared would come from, without network access")]
    Status,
    #[command(about = "Remove the cached cloudflared binary")]
    Clean,
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Version => Self::Version,
            Commands::Cloudflared { tool, subcommand } => {
                let context = ToolContext::from(tool);
                match subcommand {
                    CloudflaredCommands::Tunnel { url, update } => Self::Tunnel {
                        url,
                        update,
                        context,
                    },
                    CloudflaredCommands::Run { update, args } => Self::Run {
                        args,
                        update,
                        context,
                    },
                    CloudflaredCommands::Ensure { update } => Self::Ensure { update, context },
                    CloudflaredCommands::Status => Self::Status { context },
                    CloudflaredCommands::Clean => Self::Clean { context },
                }
            }
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
