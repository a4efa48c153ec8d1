//! Share address parsing.
//!
//! Network shares are written either as `host:path` (NFS style), `host/path`,
//! or as a UNC path (`//host/share`, `\\host\share`).

use snafu::ensure;

use crate::error::{MalformedAddressSnafu, Result};

/// Host and remote path of a network share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareAddress {
    pub host: String,
    pub remote_path: String,
}

impl ShareAddress {
    /// Parses `host:path` or `host/path`.
    ///
    /// The first colon wins; without one the first slash splits, and stays
    /// part of the path.
    ///
    /// ```
    /// use remote_mount_core::share::ShareAddress;
    ///
    /// let a = ShareAddress::parse("10.10.10.10:/to_share").unwrap();
    /// let b = ShareAddress::parse("10.10.10.10/to_share").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.remote_path, "/to_share");
    /// ```
    pub fn parse(address: &str) -> Result<Self> {
        let (host, remote_path) = if let Some((host, path)) = address.split_once(':') {
            (host, path)
        } else if let Some(idx) = address.find('/') {
            address.split_at(idx)
        } else {
            return MalformedAddressSnafu {
                address,
                reason: "expected 'host:path' or 'host/path'",
            }
            .fail();
        };

        Self::build(address, host, remote_path)
    }

    /// Like [`parse`](Self::parse), but rejects backslashes so Windows-style
    /// paths are not silently taken apart.
    pub fn parse_nfs(address: &str) -> Result<Self> {
        ensure!(
            !address.contains('\\'),
            MalformedAddressSnafu {
                address,
                reason: "backslashes are not allowed in NFS addresses",
            }
        );
        Self::parse(address)
    }

    /// Parses a UNC-like path, with or without its leading separators.
    ///
    /// The path keeps the separator that followed the host, so the share can be
    /// re-rendered verbatim for the target OS.
    pub fn parse_unc(address: &str) -> Result<Self> {
        let trimmed = address.trim_start_matches(['/', '\\']);
        let Some(idx) = trimmed.find(['/', '\\']) else {
            return MalformedAddressSnafu {
                address,
                reason: "expected '//host/share'",
            }
            .fail();
        };
        let (host, remote_path) = trimmed.split_at(idx);

        Self::build(address, host, remote_path)
    }

    /// Renders `host:path`.
    pub fn nfs_spec(&self) -> String {
        format!("{}:{}", self.host, self.remote_path)
    }

    fn build(address: &str, host: &str, remote_path: &str) -> Result<Self> {
        ensure!(
            !host.is_empty(),
            MalformedAddressSnafu {
                address,
                reason: "missing host",
            }
        );
        // A bare "/" exports the root; other separator-only paths are empty.
        let has_path = remote_path == "/" || !remote_path.trim_matches(['/', '\\']).is_empty();
        ensure!(
            has_path,
            MalformedAddressSnafu {
                address,
                reason: "missing remote path",
            }
        );

        Ok(Self {
            host: host.to_string(),
            remote_path: remote_path.to_string(),
        })
    }
}
