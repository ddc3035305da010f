//! External command execution.
//!
//! Everything this charm changes on the host goes through a [`CommandRunner`].
//! The production [`SystemRunner`] spawns real processes; tests swap in a
//! scripted runner that records what would have been run.

use std::fmt;
use std::process::{Command, Stdio};

use crate::error::HostError;

// ---------------------------------------------------------------------------
// Command description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Plain(String),
    Secret(String),
}

impl Arg {
    fn value(&self) -> &str {
        match self {
            Arg::Plain(v) | Arg::Secret(v) => v,
        }
    }
}

/// An argument vector plus environment overrides.
///
/// Arguments added with [`CommandSpec::secret_arg`] are passed to the process
/// unchanged but rendered as `***` by [`fmt::Display`], which is what logs and
/// error messages use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<Arg>,
    env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|a| Arg::Plain(a.into())));
        self
    }

    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Secret(arg.into()));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Real argument values, secrets included. Only for handing to a process.
    pub fn arg_values(&self) -> Vec<String> {
        self.args.iter().map(|a| a.value().to_owned()).collect()
    }

    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            match arg {
                Arg::Plain(v) => write!(f, " {v}")?,
                Arg::Secret(_) => f.write_str(" ***")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Convert a non-zero exit into [`HostError::CommandFailed`].
    pub fn into_checked(self, command: &CommandSpec) -> Result<CommandOutput, HostError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(HostError::CommandFailed {
            command: command.to_string(),
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
        })
    }
}

// ---------------------------------------------------------------------------
// Runner trait
// ---------------------------------------------------------------------------

/// Runs external programs to completion.
pub trait CommandRunner {
    /// Run `command` and return its output whatever the exit status.
    ///
    /// Fails only when the process cannot be started.
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, HostError>;

    /// Run `command` and fail with [`HostError::CommandFailed`] on non-zero exit.
    fn check(&self, command: &CommandSpec) -> Result<CommandOutput, HostError> {
        self.run(command)?.into_checked(command)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, HostError> {
        (**self).run(command)
    }
}

/// Spawns real processes with `std::process::Command`.
///
/// stdin is closed; stdout and stderr are captured and decoded lossily, so a
/// client that prints raw bytes still yields a usable string.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, HostError> {
        tracing::debug!(command = %command, "running");
        let output = Command::new(command.program())
            .args(command.arg_values())
            .envs(command.env_vars().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| HostError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.is_success() {
            tracing::debug!(
                command = %command,
                exit_code = ?result.exit_code,
                stderr = %result.stderr.trim(),
                "command exited non-zero"
            );
        }
        Ok(result)
    }
}
