//! Local command execution with privilege escalation support.
//!
//! Mounting usually requires root, so [`LocalConnection`] can wrap every
//! command with `pkexec` (GUI) or `sudo` (TTY).

use std::fs;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use snafu::{OptionExt, ResultExt};

use crate::error::{CommandError, SpawnSnafu, UnparsableSnafu};
use crate::executor::{CommandOutput, Connection};
use crate::os::OsName;

/// Exit code pkexec and sudo return when authentication is dismissed.
const AUTH_CANCELLED_CODE: i32 = 126;

/// Privilege escalation method for executing commands that require root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrivilegeEscalation {
    /// Execute directly without privilege escalation.
    #[default]
    None,
    /// Use `pkexec` for GUI-based privilege escalation (polkit).
    Pkexec,
    /// Use `sudo` for TTY-based privilege escalation.
    Sudo,
}

impl PrivilegeEscalation {
    fn wrapper(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Pkexec => Some("pkexec"),
            Self::Sudo => Some("sudo"),
        }
    }
}

/// Connection to the machine this process runs on.
///
/// # Example
///
/// ```
/// use remote_mount_core::local::{LocalConnection, PrivilegeEscalation};
///
/// // Default: no privilege escalation
/// let conn = LocalConnection::default();
///
/// // For terminal applications
/// let tty = LocalConnection::with_sudo();
/// assert_eq!(tty.escalation(), PrivilegeEscalation::Sudo);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalConnection {
    escalation: PrivilegeEscalation,
}

impl LocalConnection {
    /// Creates a local connection with no privilege escalation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a local connection that runs commands through `pkexec`.
    pub fn with_pkexec() -> Self {
        Self::with_escalation(PrivilegeEscalation::Pkexec)
    }

    /// Creates a local connection that runs commands through `sudo`.
    pub fn with_sudo() -> Self {
        Self::with_escalation(PrivilegeEscalation::Sudo)
    }

    pub fn with_escalation(escalation: PrivilegeEscalation) -> Self {
        Self { escalation }
    }

    pub fn escalation(&self) -> PrivilegeEscalation {
        self.escalation
    }

    /// Splits a command string into argv, honoring the shell flag.
    ///
    /// On Windows every command goes through `cmd /C` since UNC paths would
    /// not survive POSIX word splitting.
    fn argv(&self, command: &str, shell: bool) -> Result<Vec<String>, CommandError> {
        let mut argv = Vec::new();
        if let Some(wrapper) = self.escalation.wrapper() {
            argv.push(wrapper.to_string());
        }

        if cfg!(windows) {
            argv.extend(["cmd".to_string(), "/C".to_string(), command.to_string()]);
        } else if shell {
            argv.extend(["bash".to_string(), "-c".to_string(), command.to_string()]);
        } else {
            argv.extend(shlex::split(command).context(UnparsableSnafu)?);
        }

        Ok(argv)
    }

    fn privileged(&self, wrapper: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(wrapper);
        cmd.args(args);
        cmd
    }
}

impl Connection for LocalConnection {
    fn execute_command(&self, command: &str, shell: bool) -> Result<CommandOutput, CommandError> {
        let argv = self.argv(command, shell)?;
        let (program, args) = argv.split_first().context(UnparsableSnafu)?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .context(SpawnSnafu { program })?;

        let exit_code = output.status.code().unwrap_or(-1);
        if self.escalation != PrivilegeEscalation::None && exit_code == AUTH_CANCELLED_CODE {
            return Err(CommandError::AuthenticationCancelled);
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn os_name(&self) -> Result<OsName, CommandError> {
        Ok(OsName::current())
    }

    fn read_text(&self, path: &str) -> io::Result<String> {
        let Some(wrapper) = self.escalation.wrapper() else {
            return fs::read_to_string(path);
        };

        let output = self.privileged(wrapper, &["cat", path]).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let kind = if stderr.contains("No such file") {
                io::ErrorKind::NotFound
            } else {
                io::ErrorKind::PermissionDenied
            };
            return Err(io::Error::new(kind, stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Writes with `tee` under the escalation wrapper, so the content never
    /// appears on a command line.
    fn write_text(&self, path: &str, content: &str) -> io::Result<()> {
        let Some(wrapper) = self.escalation.wrapper() else {
            return fs::write(path, content);
        };

        let mut child = self
            .privileged(wrapper, &["tee", path])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(content.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("failed to write {path} with elevated privileges"),
            ));
        }

        Ok(())
    }
}
