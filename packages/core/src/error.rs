//! Unified error types for the remote-mount-core library.
//!
//! Uses SNAFU for context-rich error handling. Every mount operation wraps the
//! same underlying [`CommandError`] in its own variant, so callers can tell an
//! NFS failure from an unmount failure without inspecting command output.

use snafu::{ResultExt, Snafu};

use crate::fs_type::FsType;
use crate::os::OsName;

/// Result type alias using the library's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to run a command over a [`Connection`](crate::executor::Connection).
///
/// Commands embedded here are always redacted.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CommandError {
    /// The process (or transport) could not be started.
    #[snafu(display("failed to execute '{program}'"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The command line could not be split into arguments.
    #[snafu(display("command line has unbalanced quoting"))]
    Unparsable,

    /// Command executed but returned non-zero exit code.
    #[snafu(display("command '{command}' exited with code {code}: {stderr}"))]
    NonZeroExit {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// Command succeeded but its output lacked the expected confirmation.
    #[snafu(display("command '{command}' did not report '{expected}': {stdout}"))]
    Unconfirmed {
        command: String,
        expected: String,
        stdout: String,
    },

    /// User cancelled the privilege escalation prompt.
    #[snafu(display("authentication cancelled by user"))]
    AuthenticationCancelled,
}

/// Unified error type for all mount operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Share address could not be split into host and remote path.
    #[snafu(display("malformed share address '{address}': {reason}"))]
    MalformedAddress {
        address: String,
        reason: &'static str,
    },

    /// The filesystem type is not available on this OS family.
    #[snafu(display("{fs_type} mount is not supported for {os}. Use other mount method."))]
    MountTypeNotSupported { fs_type: FsType, os: OsName },

    /// Invalid filesystem type name.
    #[snafu(display("invalid filesystem type: {fs}"))]
    InvalidFilesystem { fs: String },

    #[snafu(display("failed to mount NFS share on '{mount_point}'"))]
    NfsMount {
        mount_point: String,
        source: CommandError,
    },

    #[snafu(display("failed to mount CIFS share on '{mount_point}'"))]
    CifsMount {
        mount_point: String,
        source: CommandError,
    },

    #[snafu(display("failed to mount SSHFS share on '{mount_point}'"))]
    SshfsMount {
        mount_point: String,
        source: CommandError,
    },

    #[snafu(display("failed to mount tmpfs on '{mount_point}'"))]
    TmpfsMount {
        mount_point: String,
        source: CommandError,
    },

    #[snafu(display("failed to mount hugetlbfs on '{mount_point}'"))]
    HugetlbfsMount {
        mount_point: String,
        source: CommandError,
    },

    /// Unmount operation failed.
    #[snafu(display("failed to unmount '{mount_point}'"))]
    Unmount {
        mount_point: String,
        source: CommandError,
    },

    /// A username is mandatory for this mount type on this OS.
    #[snafu(display("{fs_type} mount on {os} requires a username"))]
    MissingCredential { fs_type: FsType, os: OsName },

    /// The credential file was written but the entry did not appear.
    #[snafu(display("{path} file does not have credentials. Updating file failed!"))]
    CredentialConfigUpdate { path: String },

    #[snafu(display("failed to read credential file {path}"))]
    CredentialFileRead {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("failed to write credential file {path}"))]
    CredentialFileWrite {
        path: String,
        source: std::io::Error,
    },
}

/// Extension trait for adding context to io::Error results.
pub trait IoResultExt<T> {
    /// Add context for credential file read errors.
    fn credential_read_context(self, path: impl Into<String>) -> Result<T>;

    /// Add context for credential file write errors.
    fn credential_write_context(self, path: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn credential_read_context(self, path: impl Into<String>) -> Result<T> {
        self.context(CredentialFileReadSnafu { path: path.into() })
    }

    fn credential_write_context(self, path: impl Into<String>) -> Result<T> {
        self.context(CredentialFileWriteSnafu { path: path.into() })
    }
}
