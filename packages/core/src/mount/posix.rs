//! Linux and other POSIX hosts: `mount -t <fs>`, `sshfs`, `umount`, `df`.

use snafu::IntoError;

use crate::error::{
    CifsMountSnafu, CommandError, Error, HugetlbfsMountSnafu, NfsMountSnafu, Result,
    SshfsMountSnafu, TmpfsMountSnafu, UnmountSnafu,
};
use crate::executor::{CommandLine, Connection, present, run_checked, run_probe};
use crate::fs_type::FsType;
use crate::os::OsName;
use crate::share::ShareAddress;

use super::FsMount;

/// Mount implementation for Linux hosts.
pub struct PosixMount<'c> {
    conn: &'c dyn Connection,
}

impl<'c> PosixMount<'c> {
    pub fn new(conn: &'c dyn Connection) -> Self {
        Self { conn }
    }

    pub(crate) fn connection(&self) -> &'c dyn Connection {
        self.conn
    }

    /// Mounts a kernel filesystem that takes its source verbatim.
    fn mount_virtual<C>(
        &self,
        fs_type: FsType,
        mount_point: &str,
        share_path: &str,
        params: Option<&str>,
        context: C,
    ) -> Result<()>
    where
        C: IntoError<Error, Source = CommandError>,
    {
        let cmd = mount_type(fs_type)
            .arg_opt(present(params))
            .arg(share_path)
            .arg(mount_point);

        run_checked(self.conn, &cmd, context)?;
        tracing::info!(mount_point, fs_type = fs_type.as_str(), "mounted");
        Ok(())
    }
}

/// Starts `mount -t <fs>`.
fn mount_type(fs_type: FsType) -> CommandLine {
    CommandLine::new("mount").arg("-t").arg(fs_type.as_str())
}

/// Appends `-o username=U[,password=P]`; nothing without a username.
fn with_credentials(cmd: CommandLine, username: Option<&str>, password: Option<&str>) -> CommandLine {
    let Some(username) = present(username) else {
        return cmd;
    };

    let cmd = cmd.arg("-o");
    match present(password) {
        Some(password) => {
            cmd.secret_arg(&format!("username={username},password="), password, "")
        }
        None => cmd.arg(format!("username={username}")),
    }
}

/// Escapes single quotes for use inside a single-quoted shell word.
fn single_quote_escape(value: &str) -> String {
    value.replace('\'', r"'\''")
}

/// Checks that `df <mount_point>` reports `mount_point` itself in its last
/// ("Mounted on") column.
///
/// For a plain directory `df` lists the filesystem that contains it, so a
/// data row alone does not mean something is mounted there. Rows are matched
/// by suffix, which keeps mount points containing spaces and rows that `df`
/// wraps onto a second line working.
fn df_shows_mount_point(stdout: &str, mount_point: &str) -> bool {
    let wanted = match mount_point.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .any(|row| {
            row.strip_suffix(wanted)
                .is_some_and(|rest| rest.ends_with(char::is_whitespace))
        })
}

impl FsMount for PosixMount<'_> {
    fn os(&self) -> OsName {
        OsName::Linux
    }

    fn mount_nfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        let address = ShareAddress::parse_nfs(share_path)?;
        let cmd = with_credentials(mount_type(FsType::Nfs), username, password)
            .arg(address.nfs_spec())
            .arg(mount_point);

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
        let cmd = with_credentials(mount_type(FsType::Cifs), username, password)
            .arg(format!("//{}{}", address.host, address.remote_path))
            .arg(mount_point);

        run_checked(self.conn, &cmd, CifsMountSnafu { mount_point })?;
        tracing::info!(mount_point, host = %address.host, "mounted CIFS share");
        Ok(())
    }

    /// The password is fed on stdin through a here-string, so the command
    /// has to run in a shell.
    fn mount_sshfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let address = ShareAddress::parse_nfs(share_path)?;
        let cmd = CommandLine::new("sshfs")
            .arg("-o")
            .arg("password_stdin")
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg(format!("{username}@{}", address.nfs_spec()))
            .arg(mount_point)
            .secret_arg("<<<'", &single_quote_escape(password), "'")
            .shell();

        run_checked(self.conn, &cmd, SshfsMountSnafu { mount_point })?;
        tracing::info!(mount_point, share = %address.nfs_spec(), "mounted SSHFS share");
        Ok(())
    }

    fn mount_tmpfs(&self, mount_point: &str, share_path: &str, params: Option<&str>) -> Result<()> {
        self.mount_virtual(
            FsType::Tmpfs,
            mount_point,
            share_path,
            params,
            TmpfsMountSnafu { mount_point },
        )
    }

    fn mount_hugetlbfs(&self, mount_point: &str, share_path: &str, params: Option<&str>) -> Result<()> {
        self.mount_virtual(
            FsType::Hugetlbfs,
            mount_point,
            share_path,
            params,
            HugetlbfsMountSnafu { mount_point },
        )
    }

    fn is_mounted(&self, mount_point: &str) -> bool {
        run_probe(self.conn, &CommandLine::new("df").arg(mount_point))
            .is_some_and(|output| df_shows_mount_point(&output.stdout, mount_point))
    }

    fn umount(&self, mount_point: &str) -> Result<()> {
        let cmd = CommandLine::new("umount").arg(mount_point);
        run_checked(self.conn, &cmd, UnmountSnafu { mount_point })?;
        tracing::info!(mount_point, "unmounted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use crate::testing::FakeConnection;

    fn linux() -> FakeConnection {
        FakeConnection::new(OsName::Linux)
    }

    #[test]
    fn test_mount_nfs() {
        let conn = linux();
        PosixMount::new(&conn)
            .mount_nfs("/mnt/shared", "10.10.10.10:/to_share", None, None)
            .unwrap();
        assert_eq!(
            conn.commands(),
            vec!["mount -t nfs 10.10.10.10:/to_share /mnt/shared"]
        );
    }

    #[test]
    fn test_mount_nfs_with_user() {
        let conn = linux();
        PosixMount::new(&conn)
            .mount_nfs("/mnt/shared", "10.10.10.10:/to_share", Some("admin"), None)
            .unwrap();
        assert_eq!(
            conn.commands(),
            vec!["mount -t nfs -o username=admin 10.10.10.10:/to_share /mnt/shared"]
        );
    }

    #[test]
    fn test_mount_nfs_with_user_password() {
        let conn = linux();
        PosixMount::new(&conn)
            .mount_nfs(
                "/mnt/shared",
                "10.10.10.10:/to_share",
                Some("admin"),
                Some("pass"),
            )
            .unwrap();
        assert_eq!(
            conn.commands(),
            vec!["mount -t nfs -o username=admin,password=pass 10.10.10.10:/to_share /mnt/shared"]
        );
    }

    #[test]
    fn test_mount_nfs_password_without_user_is_omitted() {
        let conn = linux();
        PosixMount::new(&conn)
            .mount_nfs("/mnt/shared", "10.10.10.10/to_share", Some(""), Some("pass"))
            .unwrap();
        assert_eq!(
            conn.commands(),
            vec!["mount -t nfs 10.10.10.10:/to_share /mnt/shared"]
        );
    }

    #[test]
    fn test_mount_nfs_rejects_backslash_before_running() {
        let conn = linux();
        let err = PosixMount::new(&conn)
            .mount_nfs("/mnt/shared", "10.10.10.10\\to_share", None, None)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedAddress { .. }));
        assert!(conn.commands().is_empty());
    }

    #[test]
    fn test_mount_nfs_failure_is_classified() {
        let conn = linux();
        conn.push_output(CommandOutput::new(32, "", "access denied by server"));
        let err = PosixMount::new(&conn)
            .mount_nfs("/mnt/shared", "10.10.10.10:/to_share", None, None)
            .unwrap_err();
        assert!(matches!(err, Error::NfsMount { .. }));
    }

    #[test]
    fn test_mount_cifs() {
        let conn = linux();
        let mount = PosixMount::new(&conn);
        mount
            .mount_cifs("/mnt/shared", "//10.10.10.10/to_share", None, None)
            .unwrap();
        mount
            .mount_cifs("/mnt/shared", "//10.10.10.10/to_share", Some("admin"), None)
            .unwrap();
        mount
            .mount_cifs(
                "/mnt/shared",
                "//10.10.10.10/to_share",
                Some("admin"),
                Some("pass"),
            )
            .unwrap();
        assert_eq!(
            conn.commands(),
            vec![
                "mount -t cifs //10.10.10.10/to_share /mnt/shared",
                "mount -t cifs -o username=admin //10.10.10.10/to_share /mnt/shared",
                "mount -t cifs -o username=admin,password=pass //10.10.10.10/to_share /mnt/shared",
            ]
        );
    }

    #[test]
    fn test_mount_cifs_failure_hides_password() {
        let conn = linux();
        conn.push_output(CommandOutput::new(1, "", "mount error(13): Permission denied"));
        let err = PosixMount::new(&conn)
            .mount_cifs(
                "/mnt/shared",
                "//10.10.10.10/to_share",
                Some("admin"),
                Some("s3cret"),
            )
            .unwrap_err();
        let Error::CifsMount { source, .. } = err else {
            panic!("expected CIFS mount error");
        };
        assert!(!source.to_string().contains("s3cret"));
        assert!(source.to_string().contains("password=*****"));
    }

    #[test]
    fn test_mount_sshfs() {
        let conn = linux();
        PosixMount::new(&conn)
            .mount_sshfs("/shared", "10.10.10.10:/to_share", "root", "root")
            .unwrap();
        assert_eq!(
            conn.calls(),
            vec![(
                "sshfs -o password_stdin -o StrictHostKeyChecking=no root@10.10.10.10:/to_share /shared <<<'root'"
                    .to_string(),
                true
            )]
        );
    }

    #[test]
    fn test_mount_sshfs_escapes_quote_in_password() {
        let conn = linux();
        PosixMount::new(&conn)
            .mount_sshfs("/shared", "10.10.10.10:/to_share", "root", "it's")
            .unwrap();
        assert!(conn.commands()[0].ends_with(r"<<<'it'\''s'"));
    }

    #[test]
    fn test_mount_tmpfs() {
        let conn = linux();
        let mount = PosixMount::new(&conn);
        mount
            .mount_tmpfs("/mnt/shared", "//10.10.10.10/to_share", Some("-o param"))
            .unwrap();
        mount
            .mount_tmpfs("/mnt/shared", "//10.10.10.10/to_share", None)
            .unwrap();
        assert_eq!(
            conn.commands(),
            vec![
                "mount -t tmpfs -o param //10.10.10.10/to_share /mnt/shared",
                "mount -t tmpfs //10.10.10.10/to_share /mnt/shared",
            ]
        );
    }

    #[test]
    fn test_mount_hugetlbfs() {
        let conn = linux();
        let mount = PosixMount::new(&conn);
        mount
            .mount_hugetlbfs("/mnt/shared", "//10.10.10.10/to_share", Some("-o param"))
            .unwrap();
        mount
            .mount_hugetlbfs("/mnt/shared", "//10.10.10.10/to_share", Some(""))
            .unwrap();
        assert_eq!(
            conn.commands(),
            vec![
                "mount -t hugetlbfs -o param //10.10.10.10/to_share /mnt/shared",
                "mount -t hugetlbfs //10.10.10.10/to_share /mnt/shared",
            ]
        );
    }

    #[test]
    fn test_mount_hugetlbfs_failure_is_classified() {
        let conn = linux();
        conn.push_output(CommandOutput::new(32, "", "unknown filesystem type"));
        let err = PosixMount::new(&conn)
            .mount_hugetlbfs("/mnt/huge", "none", None)
            .unwrap_err();
        assert!(matches!(err, Error::HugetlbfsMount { .. }));
    }

    #[test]
    fn test_is_mounted_true() {
        let conn = linux();
        conn.push_output(CommandOutput::new(
            0,
            "\nFilesystem        1K-blocks    Used Available Use% Mounted on\n\
             remote_filesystem 359061248 6105984 352955264   2% /shared_directory\n",
            "",
        ));
        assert!(PosixMount::new(&conn).is_mounted("/shared_directory"));
        assert_eq!(conn.commands(), vec!["df /shared_directory"]);
    }

    #[test]
    fn test_is_mounted_false_for_plain_directory() {
        let conn = linux();
        conn.push_output(CommandOutput::new(
            0,
            "Filesystem     1K-blocks     Used Available Use% Mounted on\n\
             /dev/sda2      479595200 91327600 363832000  21% /\n",
            "",
        ));
        assert!(!PosixMount::new(&conn).is_mounted("/mnt/shared"));
    }

    #[test]
    fn test_df_mount_point_matching() {
        let wrapped = "Filesystem 1K-blocks Used Available Use% Mounted on\n\
                       10.10.10.10:/a/very/long/export/path\n\
                       \t359061248 6105984 352955264 2% /mnt/shared\n";
        assert!(df_shows_mount_point(wrapped, "/mnt/shared"));
        assert!(df_shows_mount_point(wrapped, "/mnt/shared/"));
        assert!(!df_shows_mount_point(wrapped, "/shared"));
        assert!(!df_shows_mount_point(wrapped, "shared"));

        let spaced = "Filesystem Size Used Avail Use% Mounted on\n\
                      //nas/media 1.0T 10G 990G 1% /mnt/my share\n";
        assert!(df_shows_mount_point(spaced, "/mnt/my share"));

        let root = "Filesystem Size Used Avail Use% Mounted on\n/dev/sda2 457G 88G 347G 21% /\n";
        assert!(df_shows_mount_point(root, "/"));
        assert!(!df_shows_mount_point("Filesystem Size Used Avail Use% Mounted on\n", "/"));
    }

    #[test]
    fn test_is_mounted_false() {
        let conn = linux();
        conn.push_output(CommandOutput::new(1, "", "df: shared_directory: No such file"));
        assert!(!PosixMount::new(&conn).is_mounted("shared_directory"));
        assert_eq!(conn.commands(), vec!["df shared_directory"]);

        let conn = linux();
        conn.push_error(CommandError::Unparsable);
        assert!(!PosixMount::new(&conn).is_mounted("shared_directory"));
    }

    #[test]
    fn test_umount() {
        let conn = linux();
        PosixMount::new(&conn).umount("/mnt/shared").unwrap();
        assert_eq!(conn.commands(), vec!["umount /mnt/shared"]);
    }

    #[test]
    fn test_umount_failure() {
        let conn = linux();
        conn.push_output(CommandOutput::new(
            32,
            "",
            "umount.nfs: remote share not in 'host:dir' format\numount.nfs: /mnt/shared: not mounted",
        ));
        let err = PosixMount::new(&conn).umount("/mnt/shared").unwrap_err();
        assert!(matches!(err, Error::Unmount { .. }));
    }
}
