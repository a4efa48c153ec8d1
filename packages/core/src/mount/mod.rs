//! Mount operations per OS family.
//!
//! Each family gets its own type implementing [`FsMount`]; [`Mount`] picks
//! the right one from the OS a connection reports. Operations a family cannot
//! perform fail with [`Error::MountTypeNotSupported`](crate::Error::MountTypeNotSupported) when called.

mod esxi;
mod freebsd;
mod generic;
mod posix;
mod windows;

pub use esxi::EsxiMount;
pub use freebsd::FreeBsdMount;
pub use generic::GenericMount;
pub use posix::PosixMount;
pub use windows::{DELETE_CONFIRMATION, WindowsMount};

use crate::error::{MountTypeNotSupportedSnafu, Result};
use crate::executor::Connection;
use crate::fs_type::FsType;
use crate::os::OsName;

/// Mount operations shared by all OS families.
///
/// Mount points are passed through verbatim: a path on POSIX hosts, a drive
/// letter such as `Z:` on Windows, a volume label on ESXi.
pub trait FsMount {
    /// OS family this implementation targets.
    fn os(&self) -> OsName;

    fn mount_nfs(
        &self,
        _mount_point: &str,
        _share_path: &str,
        _username: Option<&str>,
        _password: Option<&str>,
    ) -> Result<()> {
        unsupported(FsType::Nfs, self.os())
    }

    fn mount_cifs(
        &self,
        _mount_point: &str,
        _share_path: &str,
        _username: Option<&str>,
        _password: Option<&str>,
    ) -> Result<()> {
        unsupported(FsType::Cifs, self.os())
    }

    fn mount_sshfs(
        &self,
        _mount_point: &str,
        _share_path: &str,
        _username: &str,
        _password: &str,
    ) -> Result<()> {
        unsupported(FsType::Sshfs, self.os())
    }

    fn mount_tmpfs(&self, _mount_point: &str, _share_path: &str, _params: Option<&str>) -> Result<()> {
        unsupported(FsType::Tmpfs, self.os())
    }

    fn mount_hugetlbfs(
        &self,
        _mount_point: &str,
        _share_path: &str,
        _params: Option<&str>,
    ) -> Result<()> {
        unsupported(FsType::Hugetlbfs, self.os())
    }

    /// Reports whether something is mounted at `mount_point`.
    ///
    /// Never fails: a command that cannot run counts as "not mounted".
    fn is_mounted(&self, mount_point: &str) -> bool;

    fn umount(&self, mount_point: &str) -> Result<()>;
}

fn unsupported(fs_type: FsType, os: OsName) -> Result<()> {
    MountTypeNotSupportedSnafu { fs_type, os }.fail()
}

/// Mount implementation selected from a connection's OS.
///
/// # Example
///
/// ```no_run
/// use remote_mount_core::local::LocalConnection;
/// use remote_mount_core::mount::{FsMount, Mount};
///
/// let conn = LocalConnection::with_sudo();
/// let mount = Mount::new(&conn);
/// mount.mount_nfs("/mnt/shared", "10.10.10.10:/shared", None, None)?;
/// assert!(mount.is_mounted("/mnt/shared"));
/// mount.umount("/mnt/shared")?;
/// # Ok::<(), remote_mount_core::Error>(())
/// ```
pub enum Mount<'c> {
    Generic(GenericMount<'c>),
    Posix(PosixMount<'c>),
    FreeBsd(FreeBsdMount<'c>),
    Windows(WindowsMount<'c>),
    Esxi(EsxiMount<'c>),
}

impl<'c> Mount<'c> {
    /// Asks the connection for its OS and picks the matching implementation.
    ///
    /// Never fails; an unknown or undetectable OS gets [`GenericMount`].
    pub fn new(conn: &'c dyn Connection) -> Self {
        let os = match conn.os_name() {
            Ok(os) => os,
            Err(e) => {
                tracing::warn!(error = %e, "could not detect OS, using generic mount");
                OsName::Other("unknown".to_string())
            }
        };
        Self::for_os(conn, os)
    }

    /// Picks the implementation for a known OS without asking the connection.
    pub fn for_os(conn: &'c dyn Connection, os: OsName) -> Self {
        tracing::debug!(%os, "selecting mount implementation");
        match os {
            OsName::Linux => Self::Posix(PosixMount::new(conn)),
            OsName::FreeBsd => Self::FreeBsd(FreeBsdMount::new(conn)),
            OsName::Windows => Self::Windows(WindowsMount::new(conn)),
            OsName::Esxi => Self::Esxi(EsxiMount::new(conn)),
            other => Self::Generic(GenericMount::new(conn, other)),
        }
    }

    /// Overrides the FreeBSD credential file; other families ignore it.
    pub fn with_credential_file(self, path: impl Into<String>) -> Self {
        match self {
            Self::FreeBsd(mount) => Self::FreeBsd(mount.with_credential_file(path)),
            other => other,
        }
    }

    fn variant(&self) -> &dyn FsMount {
        match self {
            Self::Generic(m) => m,
            Self::Posix(m) => m,
            Self::FreeBsd(m) => m,
            Self::Windows(m) => m,
            Self::Esxi(m) => m,
        }
    }
}

impl FsMount for Mount<'_> {
    fn os(&self) -> OsName {
        self.variant().os()
    }

    fn mount_nfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        self.variant()
            .mount_nfs(mount_point, share_path, username, password)
    }

    fn mount_cifs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        self.variant()
            .mount_cifs(mount_point, share_path, username, password)
    }

    fn mount_sshfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: &str,
        password: &str,
    ) -> Result<()> {
        self.variant()
            .mount_sshfs(mount_point, share_path, username, password)
    }

    fn mount_tmpfs(&self, mount_point: &str, share_path: &str, params: Option<&str>) -> Result<()> {
        self.variant().mount_tmpfs(mount_point, share_path, params)
    }

    fn mount_hugetlbfs(&self, mount_point: &str, share_path: &str, params: Option<&str>) -> Result<()> {
        self.variant().mount_hugetlbfs(mount_point, share_path, params)
    }

    fn is_mounted(&self, mount_point: &str) -> bool {
        self.variant().is_mounted(mount_point)
    }

    fn umount(&self, mount_point: &str) -> Result<()> {
        self.variant().umount(mount_point)
    }
}
