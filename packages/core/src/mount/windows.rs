//! Windows hosts: NFS client `mount`, SMB through `net use`.

use snafu::ResultExt;

use crate::error::{CifsMountSnafu, NfsMountSnafu, Result, UnconfirmedSnafu, UnmountSnafu};
use crate::executor::{CommandLine, Connection, present, run_checked, run_probe};
use crate::os::OsName;
use crate::share::ShareAddress;

use super::FsMount;

/// Phrase `net use <drive> /delete` prints once the drive is gone.
///
/// The exit code alone is not trusted.
pub const DELETE_CONFIRMATION: &str = "was deleted successfully";

/// Mount implementation for Windows hosts. Mount points are drive letters.
pub struct WindowsMount<'c> {
    conn: &'c dyn Connection,
}

impl<'c> WindowsMount<'c> {
    pub fn new(conn: &'c dyn Connection) -> Self {
        Self { conn }
    }
}

impl FsMount for WindowsMount<'_> {
    fn os(&self) -> OsName {
        OsName::Windows
    }

    fn mount_nfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        let address = ShareAddress::parse(share_path)?;
        let mut cmd = CommandLine::new("mount").arg_opt(present(username).map(|u| format!("-u:{u}")));
        if let Some(password) = present(password) {
            cmd = cmd.secret_arg("-p:", password, "");
        }
        let cmd = cmd.arg(address.nfs_spec()).arg(mount_point);

        run_checked(self.conn, &cmd, NfsMountSnafu { mount_point })?;
        tracing::info!(mount_point, share = %address.nfs_spec(), "mounted NFS share");
        Ok(())
    }

    fn mount_cifs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        let address = ShareAddress::parse_unc(share_path)?;
        let mut cmd = CommandLine::new("net")
            .arg("use")
            .arg(mount_point)
            .arg(format!(r"\\{}{}", address.host, address.remote_path))
            .arg("/persistent:no");

        // net use only takes a password after /user:
        if let Some(username) = present(username) {
            cmd = cmd.arg(format!("/user:{username}"));
            if let Some(password) = present(password) {
                cmd = cmd.secret_arg("", password, "");
            }
        }

        run_checked(self.conn, &cmd, CifsMountSnafu { mount_point })?;
        tracing::info!(mount_point, host = %address.host, "mounted CIFS share");
        Ok(())
    }

    fn is_mounted(&self, mount_point: &str) -> bool {
        run_probe(self.conn, &CommandLine::new("net").arg("use").arg(mount_point)).is_some()
    }

    fn umount(&self, mount_point: &str) -> Result<()> {
        let cmd = CommandLine::new("net")
            .arg("use")
            .arg(mount_point)
            .arg("/delete");

        let output = run_checked(self.conn, &cmd, UnmountSnafu { mount_point })?;
        if !output.stdout.contains(DELETE_CONFIRMATION) {
            return UnconfirmedSnafu {
                command: cmd.redacted(),
                expected: DELETE_CONFIRMATION,
                stdout: output.stdout,
            }
            .fail()
            .context(UnmountSnafu { mount_point });
        }

        tracing::info!(mount_point, "unmounted");
        Ok(())
    }
}
