//! Running a provisioned tool.

use std::process::Command;

use tracing::debug;

use crate::provision::Executable;
use crate::{Error, Result};

/// Run `executable` with `args` and wait for it to exit.
///
/// Stdio is inherited, so the tool's output goes straight to the terminal.
///
/// # Errors
///
/// Returns [`Error::CommandSpawn`] if the process cannot start and
/// [`Error::ExternalCommand`] with the raw exit code if it exits unsuccessfully.
pub fn run<I, S>(executable: &Executable, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let program = executable.to_string();
    let mut command = Command::new(executable.program());
    command.args(args);
    debug!(%program, args = ?command.get_args().collect::<Vec<_>>(), "Running external command");

    let status = command.status().map_err(|source| Error::CommandSpawn {
        program: program.clone(),
        source,
    })?;

    if status.success() {
        return Ok(());
    }

    debug!(%program, code = ?status.code(), "External command failed");
    Err(Error::ExternalCommand {
        program,
        exit_code: status.code(),
    })
}
