//! FreeBSD `nsmb.conf` credential handling.
//!
//! `mount_smbfs` reads share passwords from sections named
//! `[HOST:USERNAME]`. Storing the password there keeps it off the command
//! line. Entries are only ever appended; existing content is preserved
//! byte for byte.

use std::io;

use snafu::ensure;

use crate::error::{CredentialConfigUpdateSnafu, IoResultExt, Result};
use crate::executor::Connection;

/// Default location of the system-wide configuration file.
pub const NSMB_CONF_PATH: &str = "/etc/nsmb.conf";

/// Returns the section name for a host/user pair, e.g. `10.10.10.10:FOO`.
pub fn section_name(host: &str, username: &str) -> String {
    format!("{}:{}", host.to_uppercase(), username.to_uppercase())
}

/// Checks whether `content` holds a password for the host/user pair.
///
/// Section names compare case-insensitively.
pub fn has_password(content: &str, host: &str, username: &str) -> bool {
    let wanted = section_name(host, username);
    let mut in_section = false;

    for line in content.lines().map(str::trim) {
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.trim().eq_ignore_ascii_case(&wanted);
            continue;
        }

        if in_section
            && line
                .split_once('=')
                .is_some_and(|(key, _)| key.trim().eq_ignore_ascii_case("password"))
        {
            return true;
        }
    }

    false
}

/// Returns `content` with a new credential section appended.
pub fn append_credentials(content: &str, host: &str, username: &str, password: &str) -> String {
    let mut output = String::with_capacity(content.len() + 64);
    output.push_str(content);
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }

    output.push('[');
    output.push_str(&section_name(host, username));
    output.push_str("]\n");
    output.push_str("password=");
    output.push_str(password);
    output.push('\n');

    output
}

/// Credential file on the host behind a connection.
pub struct CredentialStore<'c> {
    conn: &'c dyn Connection,
    path: &'c str,
}

impl<'c> CredentialStore<'c> {
    pub fn new(conn: &'c dyn Connection, path: &'c str) -> Self {
        Self { conn, path }
    }

    /// Reads the file; a missing file reads as empty.
    fn read(&self) -> Result<String> {
        match self.conn.read_text(self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            other => other.credential_read_context(self.path),
        }
    }

    /// Makes sure a password is stored for the host/user pair.
    ///
    /// Appends a section if none exists, then reads the file back to confirm
    /// the entry took effect.
    pub fn ensure(&self, host: &str, username: &str, password: &str) -> Result<()> {
        let content = self.read()?;
        if has_password(&content, host, username) {
            tracing::debug!(path = self.path, section = %section_name(host, username), "credentials already stored");
            return Ok(());
        }

        let updated = append_credentials(&content, host, username, password);
        self.conn
            .write_text(self.path, &updated)
            .credential_write_context(self.path)?;

        ensure!(
            has_password(&self.read()?, host, username),
            CredentialConfigUpdateSnafu { path: self.path }
        );

        tracing::info!(path = self.path, section = %section_name(host, username), "stored share credentials");
        Ok(())
    }
}
