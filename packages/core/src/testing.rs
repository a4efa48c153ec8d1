//! Recording connection used by unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use crate::error::CommandError;
use crate::executor::{CommandOutput, Connection};
use crate::os::OsName;

type Responder = Box<dyn Fn(&str) -> Result<CommandOutput, CommandError>>;

/// Fake host that records every command and answers from a script.
///
/// Queued results are returned first; after that the responder (if any) is
/// asked, and otherwise every command succeeds with empty output.
pub(crate) struct FakeConnection {
    os: OsName,
    calls: RefCell<Vec<(String, bool)>>,
    queued: RefCell<VecDeque<Result<CommandOutput, CommandError>>>,
    responder: Option<Responder>,
    file: RefCell<Option<String>>,
    queued_reads: RefCell<VecDeque<String>>,
    writes: RefCell<Vec<(String, String)>>,
}

impl FakeConnection {
    pub fn new(os: OsName) -> Self {
        Self {
            os,
            calls: RefCell::new(Vec::new()),
            queued: RefCell::new(VecDeque::new()),
            responder: None,
            file: RefCell::new(None),
            queued_reads: RefCell::new(VecDeque::new()),
            writes: RefCell::new(Vec::new()),
        }
    }

    pub fn with_responder(
        mut self,
        responder: impl Fn(&str) -> Result<CommandOutput, CommandError> + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Sets the content every read returns until a write replaces it.
    pub fn with_file(self, content: &str) -> Self {
        *self.file.borrow_mut() = Some(content.to_string());
        self
    }

    /// Queues read results that take precedence over the file content.
    pub fn with_reads(self, reads: &[&str]) -> Self {
        self.queued_reads
            .borrow_mut()
            .extend(reads.iter().map(|r| r.to_string()));
        self
    }

    pub fn push_output(&self, output: CommandOutput) {
        self.queued.borrow_mut().push_back(Ok(output));
    }

    pub fn push_error(&self, error: CommandError) {
        self.queued.borrow_mut().push_back(Err(error));
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.borrow().clone()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.borrow().clone()
    }
}

impl Connection for FakeConnection {
    fn execute_command(&self, command: &str, shell: bool) -> Result<CommandOutput, CommandError> {
        self.calls.borrow_mut().push((command.to_string(), shell));
        if let Some(result) = self.queued.borrow_mut().pop_front() {
            return result;
        }
        match &self.responder {
            Some(responder) => responder(command),
            None => Ok(CommandOutput::default()),
        }
    }

    fn os_name(&self) -> Result<OsName, CommandError> {
        Ok(self.os.clone())
    }

    fn read_text(&self, _path: &str) -> io::Result<String> {
        if let Some(content) = self.queued_reads.borrow_mut().pop_front() {
            return Ok(content);
        }
        self.file
            .borrow()
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn write_text(&self, path: &str, content: &str) -> io::Result<()> {
        self.writes
            .borrow_mut()
            .push((path.to_string(), content.to_string()));
        *self.file.borrow_mut() = Some(content.to_string());
        Ok(())
    }
}
