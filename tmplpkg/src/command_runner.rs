//! Abstraction over external command execution for testability.
//!
//! Every tool the builder shells out to (git, bundler, npm, grunt, sass,
//! rsync, python, mdfind) goes through the [`CommandRunner`] trait so the
//! orchestration can be exercised in-process without spawning anything.
//!
//! # Production Usage
//!
//! [`RealCommandRunner`] delegates to [`std::process::Command`]. Children
//! inherit stdio for [`run_status`](CommandRunner::run_status), so the
//! output of long builds streams straight to the terminal.
//!
//! # Testing Usage
//!
//! [`MockCommandRunner`] records all calls and returns canned responses.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Output};
use std::sync::Mutex;

use crate::error::BuildError;

/// Trait for abstracting external command execution.
pub trait CommandRunner: Send + Sync {
    /// Run a command and capture its full output (stdout + stderr + exit status).
    ///
    /// Used for version queries and the `mdfind` lookup.
    fn run_output(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<Output>;

    /// Run a command and return only its exit status (inherits stdio).
    fn run_status(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
    ) -> Result<ExitStatus>;

    /// Run a command and turn a non-zero exit status into [`BuildError::CommandFailed`].
    fn run_checked(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<()> {
        if options.echo {
            crate::output::Output::running(describe(program, args));
        }
        tracing::debug!(program, ?args, cwd = ?options.cwd, "Spawning command");
        let status = self.run_status(program, args, options)?;
        if !status.success() {
            return Err(BuildError::CommandFailed {
                command: describe(program, args),
                status: status
                    .code()
                    .map_or_else(|| "terminated by signal".to_string(), |c| c.to_string()),
            }
            .into());
        }
        Ok(())
    }
}

/// Render a command line for messages.
pub fn describe(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Options for command execution.
#[derive(Debug, Default, Clone)]
pub struct CommandOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Print the command line before running it (`--verbose`).
    pub echo: bool,
}

impl CommandOptions {
    /// Create options with a working directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Default::default()
        }
    }

    /// Toggle echoing of the command line.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

/// Production implementation that delegates to [`std::process::Command`].
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl RealCommandRunner {
    fn command(program: &str, args: &[&str], options: &CommandOptions) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

impl CommandRunner for RealCommandRunner {
    fn run_output(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<Output> {
        Self::command(program, args, options)
            .output()
            .with_context(|| format!("Failed to run '{program}'"))
    }

    fn run_status(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
    ) -> Result<ExitStatus> {
        Self::command(program, args, options)
            .status()
            .with_context(|| format!("Failed to run '{program}'"))
    }
}

/// A single recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Whether the command line was echoed before running.
    pub echo: bool,
}

impl RecordedCall {
    /// `program arg1 arg2 ...`
    pub fn command_line(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        describe(&self.program, &args)
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Exit { code: i32, stdout: String },
    SpawnError,
}

/// Test runner: records every call and answers from a table keyed by program.
///
/// Programs without a canned response exit 0 with empty output.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `program` with exit code 0 and the given stdout.
    pub fn stdout(mut self, program: &str, stdout: &str) -> Self {
        self.responses.insert(
            program.to_string(),
            Canned::Exit {
                code: 0,
                stdout: stdout.to_string(),
            },
        );
        self
    }

    /// Answer `program` with a non-zero exit code.
    pub fn fail(mut self, program: &str, code: i32) -> Self {
        self.responses.insert(
            program.to_string(),
            Canned::Exit {
                code,
                stdout: String::new(),
            },
        );
        self
    }

    /// Make spawning `program` fail, as if it were not installed.
    pub fn missing(mut self, program: &str) -> Self {
        self.responses
            .insert(program.to_string(), Canned::SpawnError);
        self
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded calls rendered as command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::command_line).collect()
    }

    fn record(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<(i32, String)> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                program: program.to_string(),
                args: args.iter().map(|a| (*a).to_string()).collect(),
                cwd: options.cwd.clone(),
                echo: options.echo,
            });
        }
        match self.responses.get(program) {
            Some(Canned::SpawnError) => anyhow::bail!("Failed to run '{program}'"),
            Some(Canned::Exit { code, stdout }) => Ok((*code, stdout.clone())),
            None => Ok((0, String::new())),
        }
    }
}

fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

impl CommandRunner for MockCommandRunner {
    fn run_output(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<Output> {
        let (code, stdout) = self.record(program, args, options)?;
        Ok(Output {
            status: exit_status(code),
            stdout: stdout.into_bytes(),
            stderr: Vec::new(),
        })
    }

    fn run_status(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
    ) -> Result<ExitStatus> {
        let (code, _) = self.record(program, args, options)?;
        Ok(exit_status(code))
    }
}
