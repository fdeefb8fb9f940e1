//! External tool invocation
//!
//! Every `CMake` call goes through [`ToolRunner`]. A run yields its exit code
//! and captured output; turning a nonzero exit into a [`BuildError`] is the
//! caller's job, done right at the step that knows what failed.
//!
//! [`BuildError`]: super::error::BuildError

use crate::env_vars::EnvSnapshot;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A fully specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program to run
    pub program: PathBuf,
    /// Arguments, not including the program
    pub args: Vec<String>,
    /// Working directory, inherited when `None`
    pub cwd: Option<PathBuf>,
    /// Full child environment, inherited when `None`
    pub env: Option<EnvSnapshot>,
}

impl ToolCommand {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Exit code and captured output of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// stdout followed by stderr (empty when output was streamed)
    pub output: String,
}

impl ToolOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Runs external commands to completion
pub trait ToolRunner {
    /// Run `command` and wait for it to exit.
    ///
    /// `Err` means the process could not be started at all; a nonzero exit is
    /// still `Ok`.
    fn run(&mut self, command: &ToolCommand) -> std::io::Result<ToolOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    /// Let the child write straight to this terminal instead of capturing
    stream: bool,
}

impl SystemRunner {
    /// Capture child output into [`ToolOutput::output`].
    #[must_use]
    pub const fn capturing() -> Self {
        Self { stream: false }
    }

    /// Inherit stdout/stderr so compiler diagnostics appear as they happen.
    #[must_use]
    pub const fn streaming() -> Self {
        Self { stream: true }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&mut self, command: &ToolCommand) -> std::io::Result<ToolOutput> {
        crate::debug::debug_command(command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::null());

        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }
        if let Some(env) = &command.env {
            cmd.env_clear();
            cmd.envs(env.iter());
        }

        if self.stream {
            let status = cmd.status()?;
            return Ok(ToolOutput {
                exit_code: status.code(),
                output: String::new(),
            });
        }

        let out = cmd.output()?;
        let mut buffer = Vec::with_capacity(out.stdout.len() + out.stderr.len());
        buffer.extend_from_slice(&out.stdout);
        buffer.extend_from_slice(&out.stderr);

        Ok(ToolOutput {
            exit_code: out.status.code(),
            output: String::from_utf8_lossy(&buffer).into_owned(),
        })
    }
}
