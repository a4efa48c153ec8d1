//! Filesystem types this library knows how to mount.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported filesystem types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsType {
    Nfs,
    Cifs,
    Sshfs,
    Tmpfs,
    Hugetlbfs,
}

impl TryFrom<&str> for FsType {
    type Error = crate::error::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "nfs" => Ok(FsType::Nfs),
            "cifs" | "smb" | "smbfs" => Ok(FsType::Cifs),
            "sshfs" => Ok(FsType::Sshfs),
            "tmpfs" => Ok(FsType::Tmpfs),
            "hugetlbfs" => Ok(FsType::Hugetlbfs),
            _ => Err(crate::error::Error::InvalidFilesystem { fs: s.to_string() }),
        }
    }
}

impl FsType {
    /// Returns the type name passed to `mount -t`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nfs => "nfs",
            Self::Cifs => "cifs",
            Self::Sshfs => "sshfs",
            Self::Tmpfs => "tmpfs",
            Self::Hugetlbfs => "hugetlbfs",
        }
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}
