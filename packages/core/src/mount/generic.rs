//! Fallback for hosts whose OS is unknown.

use crate::error::Result;
use crate::executor::Connection;
use crate::os::OsName;

use super::{FsMount, PosixMount};

/// POSIX-compatible default: NFS, `umount` and `df` work as on Linux, the
/// other mount types fail with `MountTypeNotSupported` naming the host OS.
pub struct GenericMount<'c> {
    posix: PosixMount<'c>,
    os: OsName,
}

impl<'c> GenericMount<'c> {
    pub fn new(conn: &'c dyn Connection, os: OsName) -> Self {
        Self {
            posix: PosixMount::new(conn),
            os,
        }
    }
}

impl FsMount for GenericMount<'_> {
    fn os(&self) -> OsName {
        self.os.clone()
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

    fn is_mounted(&self, mount_point: &str) -> bool {
        self.posix.is_mounted(mount_point)
    }

    fn umount(&self, mount_point: &str) -> Result<()> {
        self.posix.umount(mount_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::FakeConnection;

    #[test]
    fn test_generic_mount_nfs() {
        let conn = FakeConnection::new(OsName::Other("SunOS".to_string()));
        let mount = GenericMount::new(&conn, OsName::Other("SunOS".to_string()));
        mount
            .mount_nfs("/mnt/shared", "10.10.10.10:/shared", None, None)
            .unwrap();
        mount.umount("/mnt/shared").unwrap();
        assert_eq!(
            conn.commands(),
            vec![
                "mount -t nfs 10.10.10.10:/shared /mnt/shared",
                "umount /mnt/shared"
            ]
        );
    }

    #[test]
    fn test_generic_rejects_other_types_at_call_time() {
        let conn = FakeConnection::new(OsName::Other("SunOS".to_string()));
        let mount = GenericMount::new(&conn, OsName::Other("SunOS".to_string()));
        let err = mount
            .mount_sshfs("/mnt/shared", "10.10.10.10:/shared", "root", "root")
            .unwrap_err();
        assert!(matches!(err, Error::MountTypeNotSupported { .. }));
        assert_eq!(
            err.to_string(),
            "SSHFS mount is not supported for SunOS. Use other mount method."
        );
        assert!(conn.commands().is_empty());
    }
}
