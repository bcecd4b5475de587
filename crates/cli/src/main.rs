//! `utile` command-line entry point.

mod cli;
mod commands;
mod errors;
mod tracing;

use ::tracing::instrument;

use crate::commands::{Command, cloudflared, version};
use crate::tracing::{TracingConfig, init_tracing};

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        report(&format!(
            "Application panicked: {panic_info}\n\
            Internal error occurred. Run with RUST_LOG=debug for more information."
        ));
    }));

    if let Err(error) = run_main() {
        let code = error
            .downcast_ref::<utile_core::Error>()
            .map_or(1, utile_core::Error::exit_code);
        report(&format!("{error:?}"));
        std::process::exit(code);
    }
}

fn run_main() -> miette::Result<()> {
    let cli = cli::parse();

    init_tracing(TracingConfig {
        format: cli.tracing_format(),
        level: cli.level.clone().into(),
        ..Default::default()
    })?;

    execute_command(cli.command.into())
}

#[instrument(name = "utile_command")]
fn execute_command(command: Command) -> miette::Result<()> {
    match command {
        Command::Version => print(&version::get_version_info()),
        Command::Tunnel {
            url,
            update,
            context,
        } => cloudflared::tunnel(&url, update, &context)?,
        Command::Run {
            args,
            update,
            context,
        } => cloudflared::run(&args, update, &context)?,
        Command::Ensure { update, context } => {
            print(&cloudflared::ensure(update, &context)?.to_string());
        }
        Command::Status { context } => print(&cloudflared::status(&context)?),
        Command::Clean { context } => print(&cloudflared::clean(&context)?),
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print(output: &str) {
    println!("{output}");
}

#[allow(clippy::print_stderr)]
fn report(message: &str) {
    eprintln!("{message}");
}
