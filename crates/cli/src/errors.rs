//! CLI-specific error types
//!
//! Library failures travel as [`utile_core::Error`]; this module only covers
//! problems that exist at the command-line layer.

use miette::Diagnostic;
use thiserror::Error;

/// CLI-specific error types with diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Invalid value for {argument}: {reason}")]
    #[diagnostic(
        code(utile::cli::invalid_argument),
        help("Run 'utile --help' to see available options")
    )]
    InvalidArgument { argument: String, reason: String },

    #[error("Tracing initialization failed")]
    #[diagnostic(
        code(utile::cli::tracing_error),
        help("Check RUST_LOG and the --level/--format flags")
    )]
    TracingError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        config_used: String,
    },
}

impl CliError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn tracing(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
        config_used: impl Into<String>,
    ) -> Self {
        Self::TracingError {
            source: source.into(),
            config_used: config_used.into(),
        }
    }
}
