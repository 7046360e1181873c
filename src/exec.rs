//! Running the provisioned executable

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::LaunchError;

/// Run `path` with `args`, inheriting stdin, stdout and stderr
///
/// Arguments are passed through unmodified. Returns once the child exits.
pub fn exec_binary(
    path: &Path,
    args: &[OsString],
    cwd: Option<&Path>,
) -> Result<ExitStatus, LaunchError> {
    debug!("Executing {:?} with {} argument(s)", path, args.len());

    let mut command = Command::new(path);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    command.status().map_err(|e| LaunchError::Exec {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Exit code to report for a finished child
///
/// A child killed by a signal has no code; it is reported the way shells do,
/// as 128 plus the signal number.
pub fn exit_code(status: &ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return (code & 0xff) as u8;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return (128 + signal).min(255) as u8;
        }
    }

    1
}
