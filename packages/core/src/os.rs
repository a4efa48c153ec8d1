//! Operating system identity reported by a connection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// OS family of the host behind a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsName {
    Linux,
    FreeBsd,
    Windows,
    Esxi,
    /// Anything else, carrying the raw identifier.
    Other(String),
}

impl OsName {
    /// Maps the output of `uname -s` to an OS family.
    ///
    /// ESXi reports its kernel as `VMkernel`; MSYS and Cygwin shells on
    /// Windows report prefixed kernel names.
    pub fn from_uname(kernel: &str) -> Self {
        let kernel = kernel.trim();
        match kernel {
            "Linux" => Self::Linux,
            "FreeBSD" => Self::FreeBsd,
            "VMkernel" => Self::Esxi,
            _ if kernel.starts_with("MINGW")
                || kernel.starts_with("MSYS")
                || kernel.starts_with("CYGWIN")
                || kernel.contains("Windows") =>
            {
                Self::Windows
            }
            _ => Self::Other(kernel.to_string()),
        }
    }

    /// Returns the OS this process was built for.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "freebsd" => Self::FreeBsd,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("Linux"),
            Self::FreeBsd => f.write_str("FreeBSD"),
            Self::Windows => f.write_str("Windows"),
            Self::Esxi => f.write_str("ESXi"),
            Self::Other(name) => f.write_str(name),
        }
    }
}
