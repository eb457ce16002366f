//! External command execution.
//!
//! `Cmd` is a small builder over `std::process::Command` used by the glue
//! layers (git fetch, QEMU). The build pipeline itself goes through the
//! `ToolRunner` trait so tests can substitute a recording implementation
//! for the real build tools.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            error_prefix: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    /// Run with inherited stdio, reporting the exit code without failing.
    ///
    /// `Err` only when the program could not be started at all.
    pub fn status(self) -> std::io::Result<i32> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status()?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Run with inherited stdio; fail on non-zero exit.
    ///
    /// Output goes directly to the terminal. Use for long-running commands
    /// where the user should see progress.
    pub fn run_interactive(self) -> Result<ExitStatus> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let status = cmd
            .status()
            .with_context(|| format!("Failed to execute '{}'. Is it installed?", self.program))?;

        if !status.success() {
            let prefix = self
                .error_prefix
                .unwrap_or_else(|| format!("'{}' failed", self.program));
            bail!("{} (exit code {})", prefix, status.code().unwrap_or(-1));
        }

        Ok(status)
    }
}

/// Seam for build-tool invocations.
///
/// Implementations stream tool output to the user and report the tool's exit
/// code; `Err` means the program could not be started at all. Callers map
/// non-zero codes into their own error variants.
pub trait ToolRunner {
    fn run(&self, program: &str, args: &[String], dir: &Path) -> std::io::Result<i32>;
}

/// Runs tools on the host with inherited stdio.
pub struct HostRunner;

impl ToolRunner for HostRunner {
    fn run(&self, program: &str, args: &[String], dir: &Path) -> std::io::Result<i32> {
        Cmd::new(program).args(args).dir(dir).status()
    }
}
