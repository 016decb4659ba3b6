//! Thin builder around `std::process::Command`.
//!
//! Every external program this tool drives (`subscription-manager`, `dnf`)
//! goes through [`Cmd`] so invocations are logged the same way and failures
//! carry the full command line.
//!
//! ```rust,ignore
//! let out = Cmd::new("subscription-manager").arg("release").run()?;
//! println!("{}", out.stdout);
//! ```

use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CmdError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O with '{command_line}' failed: {source}")]
    Io {
        command_line: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message} (exit code {code:?}): {stderr}")]
    Failed {
        command_line: String,
        code: Option<i32>,
        stderr: String,
        message: String,
    },
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CmdResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    stdin: Option<String>,
    error_msg: Option<String>,
    allow_fail: bool,
}

impl Cmd {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            error_msg: None,
            allow_fail: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_owned());
        self
    }

    /// Feed `input` to the child's stdin, then close it.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Message used when the command exits non-zero.
    pub fn error_msg(mut self, msg: &str) -> Self {
        self.error_msg = Some(msg.to_string());
        self
    }

    /// Return the result instead of an error on non-zero exit.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn run(self) -> Result<CmdResult, CmdError> {
        let command_line = self.command_line();
        debug!("running: {}", command_line);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let spawn_err = |source| CmdError::Spawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        };

        let mut child = command.spawn().map_err(spawn_err)?;
        let io_err = |source| CmdError::Io {
            command_line: command_line.clone(),
            source,
        };
        if let Some(input) = &self.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // A child that exits without reading stdin reports through its status.
                match pipe.write_all(input.as_bytes()) {
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(io_err(e)),
                    _ => {}
                }
            }
        }
        let output = child.wait_with_output().map_err(io_err)?;

        let result = CmdResult {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() && !self.allow_fail {
            debug!("'{}' failed: {}", command_line, result.stderr.trim());
            return Err(CmdError::Failed {
                message: self
                    .error_msg
                    .unwrap_or_else(|| format!("'{}' failed", command_line)),
                command_line,
                code: result.code,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}
