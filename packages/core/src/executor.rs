//! Command execution abstraction.
//!
//! Mount variants never spawn processes themselves. They build a
//! [`CommandLine`] and hand it to a [`Connection`], which may run it locally,
//! over SSH, or only record it.

use std::fmt;

use serde::Serialize;
use snafu::{IntoError, ResultExt};

use crate::error::{CommandError, Error, NonZeroExitSnafu, Result};
use crate::os::OsName;

/// Placeholder written in place of secrets in logs and errors.
pub const REDACTED: &str = "*****";

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A host on which mount commands are executed.
///
/// Implementations report the raw exit status; interpreting it is left to the
/// caller.
pub trait Connection {
    /// Executes a command string. When `shell` is set the string is handed to
    /// a shell (needed for redirections such as `<<<`).
    fn execute_command(
        &self,
        command: &str,
        shell: bool,
    ) -> std::result::Result<CommandOutput, CommandError>;

    /// Identifies the OS family of the host.
    fn os_name(&self) -> std::result::Result<OsName, CommandError>;

    /// Reads a text file on the host.
    fn read_text(&self, path: &str) -> std::io::Result<String>;

    /// Replaces the content of a text file on the host.
    fn write_text(&self, path: &str, content: &str) -> std::io::Result<()>;
}

/// A command string under construction, with a redacted twin for display.
///
/// `Debug` and `Display` both show the redacted form.
#[derive(Clone, Default)]
pub struct CommandLine {
    text: String,
    redacted: String,
    shell: bool,
}

impl CommandLine {
    /// Starts a command with the given program name.
    pub fn new(program: &str) -> Self {
        Self {
            text: program.to_string(),
            redacted: program.to_string(),
            shell: false,
        }
    }

    /// Appends a space-separated argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        let arg = arg.as_ref();
        self.push(arg, arg);
        self
    }

    /// Appends an argument only if it is present and non-empty.
    pub fn arg_opt(self, arg: Option<impl AsRef<str>>) -> Self {
        match arg {
            Some(arg) if !arg.as_ref().is_empty() => self.arg(arg),
            _ => self,
        }
    }

    /// Appends `prefix + secret + suffix` as one argument; only the secret is
    /// masked in the redacted form.
    pub fn secret_arg(mut self, prefix: &str, secret: &str, suffix: &str) -> Self {
        self.push(
            &format!("{prefix}{secret}{suffix}"),
            &format!("{prefix}{REDACTED}{suffix}"),
        );
        self
    }

    /// Marks the command as needing a shell.
    pub fn shell(mut self) -> Self {
        self.shell = true;
        self
    }

    pub fn is_shell(&self) -> bool {
        self.shell
    }

    /// The exact string sent to the connection.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The command with every secret masked.
    pub fn redacted(&self) -> &str {
        &self.redacted
    }

    fn push(&mut self, text: &str, redacted: &str) {
        self.text.push(' ');
        self.text.push_str(text);
        self.redacted.push(' ');
        self.redacted.push_str(redacted);
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLine")
            .field("command", &self.redacted)
            .field("shell", &self.shell)
            .finish()
    }
}

/// Runs a command and requires exit code 0.
///
/// `context` is the SNAFU context selector that classifies a failure, e.g.
/// `NfsMountSnafu { mount_point }`.
pub fn run_checked<C>(conn: &dyn Connection, command: &CommandLine, context: C) -> Result<CommandOutput>
where
    C: IntoError<Error, Source = CommandError>,
{
    tracing::debug!(command = %command, shell = command.is_shell(), "executing");

    conn.execute_command(command.as_str(), command.is_shell())
        .and_then(|output| {
            if output.success() {
                Ok(output)
            } else {
                NonZeroExitSnafu {
                    command: command.redacted(),
                    code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                }
                .fail()
            }
        })
        .context(context)
}

/// Runs a command whose failure is an expected answer rather than an error.
///
/// Returns `None` if the command could not be executed or exited non-zero.
pub fn run_probe(conn: &dyn Connection, command: &CommandLine) -> Option<CommandOutput> {
    tracing::debug!(command = %command, "probing");

    match conn.execute_command(command.as_str(), command.is_shell()) {
        Ok(output) if output.success() => Some(output),
        Ok(output) => {
            tracing::debug!(command = %command, code = output.exit_code, "probe exited non-zero");
            None
        }
        Err(e) => {
            tracing::debug!(command = %command, error = %e, "probe failed");
            None
        }
    }
}

/// Returns the value only if it is present and non-empty.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
