//! Remote execution through the system `ssh` client.
//!
//! Authentication is left to the user's SSH setup (agent or identity file);
//! the client runs in batch mode and never prompts.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use snafu::ResultExt;

use crate::error::{CommandError, SpawnSnafu};
use crate::executor::{CommandOutput, Connection};
use crate::os::OsName;

/// Connection to a remote host over SSH.
#[derive(Debug, Clone)]
pub struct SshConnection {
    destination: String,
    port: Option<u16>,
    identity: Option<PathBuf>,
}

impl SshConnection {
    /// `destination` is anything `ssh` accepts, e.g. `root@10.10.10.10`.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            port: None,
            identity: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_identity(mut self, identity: impl Into<PathBuf>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Builds the `ssh` invocation for a remote command string.
    fn ssh(&self, remote_command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(["-o", "BatchMode=yes"]);
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.identity {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(&self.destination).arg("--").arg(remote_command);
        cmd
    }

    fn run(&self, remote_command: &str) -> Result<CommandOutput, CommandError> {
        let output = self
            .ssh(remote_command)
            .stdin(Stdio::null())
            .output()
            .context(SpawnSnafu { program: "ssh" })?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Wraps a command for `bash -c`, quoting it as a single word.
fn shell_wrap(command: &str) -> Result<String, CommandError> {
    let quoted = shlex::try_quote(command).map_err(|_| CommandError::Unparsable)?;
    Ok(format!("bash -c {quoted}"))
}

impl Connection for SshConnection {
    fn execute_command(&self, command: &str, shell: bool) -> Result<CommandOutput, CommandError> {
        if shell {
            self.run(&shell_wrap(command)?)
        } else {
            self.run(command)
        }
    }

    /// Asks `uname -s` first; hosts without it are probed with `ver`, which
    /// only Windows answers.
    fn os_name(&self) -> Result<OsName, CommandError> {
        let uname = self.run("uname -s")?;
        if uname.success() && !uname.stdout.trim().is_empty() {
            return Ok(OsName::from_uname(&uname.stdout));
        }

        let ver = self.run("ver")?;
        if ver.success() && ver.stdout.contains("Windows") {
            return Ok(OsName::Windows);
        }

        Ok(OsName::Other(uname.stdout.trim().to_string()))
    }

    fn read_text(&self, path: &str) -> io::Result<String> {
        let quoted = shlex::try_quote(path).map_err(io::Error::other)?;
        let output = self.run(&format!("cat {quoted}")).map_err(io::Error::other)?;
        if !output.success() {
            let kind = if output.stderr.contains("No such file") {
                io::ErrorKind::NotFound
            } else {
                io::ErrorKind::Other
            };
            return Err(io::Error::new(kind, output.stderr));
        }
        Ok(output.stdout)
    }

    fn write_text(&self, path: &str, content: &str) -> io::Result<()> {
        let quoted = shlex::try_quote(path).map_err(io::Error::other)?;
        let mut child = self
            .ssh(&format!("tee {quoted}"))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(content.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "failed to write {path} on {}",
                self.destination
            )));
        }

        Ok(())
    }
}
