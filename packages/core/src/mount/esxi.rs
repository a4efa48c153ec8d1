//! ESXi hosts: NFS datastores through `esxcli storage nfs`.
//!
//! Here the mount point is a datastore volume label, not a path.

use crate::error::{NfsMountSnafu, Result, UnmountSnafu};
use crate::executor::{CommandLine, Connection, present, run_checked, run_probe};
use crate::os::OsName;
use crate::share::ShareAddress;

use super::FsMount;

/// Mount implementation for ESXi hosts. Only NFS is available.
pub struct EsxiMount<'c> {
    conn: &'c dyn Connection,
}

impl<'c> EsxiMount<'c> {
    pub fn new(conn: &'c dyn Connection) -> Self {
        Self { conn }
    }
}

fn esxcli_nfs(action: &str) -> CommandLine {
    CommandLine::new("esxcli")
        .arg("storage")
        .arg("nfs")
        .arg(action)
}

/// Looks for `label` in the "Volume Name" column of `esxcli storage nfs list`.
///
/// Rows start after the dashed rule under the header. The first run of dashes
/// spans the column, so labels containing spaces are read whole.
fn volume_listed(listing: &str, label: &str) -> bool {
    let mut lines = listing
        .lines()
        .skip_while(|line| !line.trim_start().starts_with('-'));
    let Some(rule) = lines.next() else {
        return false;
    };

    let start = rule.chars().take_while(|c| c.is_whitespace()).count();
    let width = rule.chars().skip(start).take_while(|&c| c == '-').count();

    lines.any(|row| {
        let volume: String = row.chars().skip(start).take(width).collect();
        let volume = volume.trim();
        !volume.is_empty() && volume == label
    })
}

impl FsMount for EsxiMount<'_> {
    fn os(&self) -> OsName {
        OsName::Esxi
    }

    fn mount_nfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        _password: Option<&str>,
    ) -> Result<()> {
        let address = ShareAddress::parse_nfs(share_path)?;
        if present(username).is_some() {
            tracing::debug!(mount_point, "esxcli NFS datastores take no credentials, ignoring");
        }

        let cmd = esxcli_nfs("add")
            .arg("-H")
            .arg(&address.host)
            .arg("-s")
            .arg(&address.remote_path)
            .arg("-v")
            .arg(mount_point);

        run_checked(self.conn, &cmd, NfsMountSnafu { mount_point })?;
        tracing::info!(volume = mount_point, share = %address.nfs_spec(), "added NFS datastore");
        Ok(())
    }

    fn is_mounted(&self, mount_point: &str) -> bool {
        run_probe(self.conn, &esxcli_nfs("list"))
            .is_some_and(|output| volume_listed(&output.stdout, mount_point))
    }

    fn umount(&self, mount_point: &str) -> Result<()> {
        let cmd = esxcli_nfs("remove").arg("-v").arg(mount_point);
        run_checked(self.conn, &cmd, UnmountSnafu { mount_point })?;
        tracing::info!(volume = mount_point, "removed NFS datastore");
        Ok(())
    }
}
