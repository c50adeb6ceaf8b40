use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::process::{Command, ExitStatus, Output};

use log::Level::Debug;
use log::{debug, log_enabled};

pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CmdOutput {
    /// Converts to a `Result` object that is `Ok` only if the [ExitStatus] is
    /// success.
    pub fn err_on_status(self) -> crate::Result<Self> {
        if self.status.success() {
            return Ok(self);
        }

        // Killed by a signal, there is no code to report
        let code = self.status.code().unwrap_or(-1);

        Err(crate::Error::CommandError(
            code,
            self.stderr_utf8_lossy().to_string(),
        ))
    }

    #[inline]
    pub fn ok(&self) -> bool {
        self.status.success()
    }

    #[inline]
    pub fn stdout_utf8_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    #[inline]
    pub fn stderr_utf8_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

impl From<Output> for CmdOutput {
    fn from(output: Output) -> Self {
        Self {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

pub fn run_cmd<C, S>(cmd: C, args: &[S]) -> io::Result<CmdOutput>
where
    C: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    if log_enabled!(Debug) {
        log_cmd(&cmd, args);
    }
    Command::new(cmd)
        .args(args)
        .output()
        .map(|output| output.into())
}

pub fn log_cmd<C, S>(cmd: &C, args: &[S])
where
    C: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    if args.is_empty() {
        debug!("Running command: `{}`", cmd.as_ref().to_string_lossy());
        return;
    }
    let args_string = args
        .iter()
        .map(|it| it.as_ref().to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(
        "Running command: `{} {}`",
        cmd.as_ref().to_string_lossy(),
        args_string
    );
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use crate::testing::cmd_output;

    #[test]
    fn test_err_on_status() {
        let ok = cmd_output(0, "fine");
        assert!(ok.ok());
        let ok = ok.err_on_status().expect("success status");
        assert_eq!(ok.stdout_utf8_lossy(), "fine");

        let mut bad = cmd_output(2, "");
        bad.stderr = b"no such service".to_vec();
        match bad.err_on_status() {
            Err(crate::Error::CommandError(code, stderr)) => {
                assert_eq!(code, 2);
                assert_eq!(stderr, "no such service");
            }
            _ => panic!("expected CommandError"),
        }
    }

    #[test]
    fn test_run_cmd() {
        let out = run_cmd("sh", &["-c", "printf hello"]).expect("running sh");
        assert!(out.ok());
        assert_eq!(out.stdout_utf8_lossy(), "hello");
    }
}
