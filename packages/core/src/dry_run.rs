//! Connection wrapper that records mount commands instead of running them.

use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, PoisonError};

use crate::error::CommandError;
use crate::executor::{CommandOutput, Connection, REDACTED};
use crate::mount::DELETE_CONFIRMATION;
use crate::os::OsName;

/// Records every command and file write, reporting success for all of them.
///
/// Commands whose success is judged from their output get the output a
/// successful run prints (`net use Z: /delete` confirms the deletion).
///
/// OS detection and file reads still go to the wrapped connection, so the
/// recorded commands match what a real run would issue. Files written during
/// the dry run are served back from memory.
pub struct DryRunConnection<'c> {
    inner: &'c dyn Connection,
    commands: Mutex<Vec<String>>,
    files: Mutex<HashMap<String, String>>,
    masked: Vec<String>,
}

impl<'c> DryRunConnection<'c> {
    pub fn new(inner: &'c dyn Connection) -> Self {
        Self {
            inner,
            commands: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            masked: Vec::new(),
        }
    }

    /// Masks `secret` in the recorded commands.
    pub fn masking(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.masked.push(secret);
        }
        self
    }

    /// Commands recorded so far, secrets masked.
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Paths written during the dry run.
    pub fn written_files(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    fn mask(&self, command: &str) -> String {
        self.masked
            .iter()
            .fold(command.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
    }
}

/// Stdout of a successful run, for commands that are checked by their output.
fn simulated_stdout(command: &str) -> String {
    let deleted_drive = command
        .strip_prefix("net use ")
        .and_then(|rest| rest.strip_suffix(" /delete"));
    match deleted_drive {
        Some(drive) => format!("{drive} {DELETE_CONFIRMATION}."),
        None => String::new(),
    }
}

impl Connection for DryRunConnection<'_> {
    fn execute_command(&self, command: &str, shell: bool) -> Result<CommandOutput, CommandError> {
        let masked = self.mask(command);
        tracing::info!(command = %masked, shell, "dry run");
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(masked);
        Ok(CommandOutput::new(0, simulated_stdout(command), ""))
    }

    fn os_name(&self) -> Result<OsName, CommandError> {
        self.inner.os_name()
    }

    fn read_text(&self, path: &str) -> io::Result<String> {
        let written = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned();
        match written {
            Some(content) => Ok(content),
            None => self.inner.read_text(path),
        }
    }

    fn write_text(&self, path: &str, content: &str) -> io::Result<()> {
        tracing::info!(path, "dry run: file not written");
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), content.to_string());
        Ok(())
    }
}
