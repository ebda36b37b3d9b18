//! External tool execution.
//!
//! Stores that can only reach their database through platform tools
//! (`certutil`, `keytool`, `security`, `powershell`) run them through a
//! [`CommandRunner`], so a scripted runner can stand in for the real
//! binaries.

use std::io;
use std::process::Command;
use tracing::debug;
use trustctl_core::{Result, TrustError};

use crate::platform::StoreKind;

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    /// Raw stdout
    pub stdout: Vec<u8>,
    /// Raw stderr
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Exit code zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }

    /// Stderr as trimmed text.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs a program to completion and captures its output.
pub trait CommandRunner {
    /// Run `program` with `args`. An `io::ErrorKind::NotFound` error means
    /// the program is not installed.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs real processes via `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Run a tool and return its output whatever the exit status.
///
/// A missing binary is [`TrustError::StoreUnavailable`]; other spawn
/// failures are [`TrustError::Io`].
pub fn invoke<R: CommandRunner + ?Sized>(
    runner: &R,
    store: StoreKind,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    debug!(store = %store, program, ?args, "running");
    runner.run(program, args).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            TrustError::unavailable(store.name(), format!("'{program}' is not installed or not on PATH"))
        } else {
            TrustError::io(program, e)
        }
    })
}

/// Run a tool that must succeed and return its stdout.
pub fn run_tool<R: CommandRunner + ?Sized>(
    runner: &R,
    store: StoreKind,
    program: &str,
    args: &[&str],
) -> Result<Vec<u8>> {
    let output = invoke(runner, store, program, args)?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(TrustError::Command {
            program: program.to_string(),
            status: output.status,
            stderr: output.stderr_text(),
        })
    }
}
