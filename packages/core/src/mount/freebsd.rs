//! FreeBSD hosts: CIFS through `mount_smbfs`, everything else as on POSIX.

use snafu::OptionExt;

use crate::error::{CifsMountSnafu, MissingCredentialSnafu, Result};
use crate::executor::{CommandLine, Connection, present, run_checked};
use crate::fs_type::FsType;
use crate::nsmb::{CredentialStore, NSMB_CONF_PATH};
use crate::os::OsName;
use crate::share::ShareAddress;

use super::{FsMount, PosixMount};

/// Mount implementation for FreeBSD hosts.
///
/// `mount_smbfs` does not accept a password argument. When one is given it
/// is stored in the credential file (`/etc/nsmb.conf` by default) first.
pub struct FreeBsdMount<'c> {
    posix: PosixMount<'c>,
    credential_file: String,
}

impl<'c> FreeBsdMount<'c> {
    pub fn new(conn: &'c dyn Connection) -> Self {
        Self {
            posix: PosixMount::new(conn),
            credential_file: NSMB_CONF_PATH.to_string(),
        }
    }

    /// Uses another credential file, e.g. a user's `~/.nsmbrc`.
    pub fn with_credential_file(mut self, path: impl Into<String>) -> Self {
        self.credential_file = path.into();
        self
    }

    pub fn credential_file(&self) -> &str {
        &self.credential_file
    }
}

impl FsMount for FreeBsdMount<'_> {
    fn os(&self) -> OsName {
        OsName::FreeBsd
    }

    fn mount_nfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        self.posix
            .mount_nfs(mount_point, share_path, username, password)
    }

    fn mount_cifs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        let username = present(username).context(MissingCredentialSnafu {
            fs_type: FsType::Cifs,
            os: OsName::FreeBsd,
        })?;
        // host:path or host/path, optionally written as //host/path
        let address = ShareAddress::parse(share_path.trim_start_matches('/'))?;

        if let Some(password) = present(password) {
            CredentialStore::new(self.posix.connection(), &self.credential_file).ensure(
                &address.host,
                username,
                password,
            )?;
        }

        let cmd = CommandLine::new("mount_smbfs")
            .arg("-I")
            .arg(&address.host)
            .arg(format!(
                "//{username}@{}{}",
                address.host, address.remote_path
            ))
            .arg(mount_point);

        run_checked(self.posix.connection(), &cmd, CifsMountSnafu { mount_point })?;
        tracing::info!(mount_point, host = %address.host, "mounted CIFS share");
        Ok(())
    }

    fn mount_sshfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: &str,
        password: &str,
    ) -> Result<()> {
        self.posix
            .mount_sshfs(mount_point, share_path, username, password)
    }

    fn mount_tmpfs(&self, mount_point: &str, share_path: &str, params: Option<&str>) -> Result<()> {
        self.posix.mount_tmpfs(mount_point, share_path, params)
    }

    fn is_mounted(&self, mount_point: &str) -> bool {
        self.posix.is_mounted(mount_point)
    }

    fn umount(&self, mount_point: &str) -> Result<()> {
        self.posix.umount(mount_point)
    }
}
