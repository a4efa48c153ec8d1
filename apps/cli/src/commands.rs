//! Subcommand execution.

use std::io::{self, Write};

use remote_mount_core::{
    CommandError, Connection, DryRunConnection, FsMount, FsType, LocalConnection, Mount, OsName,
    SshConnection,
};
use serde::Serialize;
use snafu::{OptionExt, ResultExt, Snafu};

use crate::{Cli, Commands};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{action} failed"))]
    Core {
        action: &'static str,
        source: remote_mount_core::Error,
    },

    #[snafu(display("could not detect the host OS"))]
    OsQuery { source: CommandError },

    #[snafu(display("{fs_type} mount requires --{option}"))]
    MissingOption {
        fs_type: FsType,
        option: &'static str,
    },

    #[snafu(display("failed to serialize status"))]
    Json { source: serde_json::Error },

    #[snafu(display("failed to write output"))]
    Output { source: io::Error },
}

/// JSON printed by `status`.
#[derive(Debug, Serialize)]
struct MountStatus<'a> {
    mount_point: &'a str,
    os: OsName,
    mounted: bool,
}

pub fn run(cli: &Cli) -> Result<(), Error> {
    warn_if_unprivileged(cli);

    let conn = connect(cli);
    let mut stdout = io::stdout().lock();

    // status and os only query the host, so they run for real
    if cli.dry_run && changes_mounts(&cli.command) {
        dry_run(&cli.command, conn.as_ref(), &mut stdout)
    } else {
        execute(&cli.command, conn.as_ref(), &mut stdout)
    }
}

fn connect(cli: &Cli) -> Box<dyn Connection> {
    match &cli.ssh {
        Some(destination) => {
            let mut ssh = SshConnection::new(destination.clone());
            if let Some(port) = cli.port {
                ssh = ssh.with_port(port);
            }
            if let Some(identity) = &cli.identity {
                ssh = ssh.with_identity(identity.clone());
            }
            tracing::debug!(destination = ssh.destination(), "using SSH connection");
            Box::new(ssh)
        }
        None if cli.sudo => Box::new(LocalConnection::with_sudo()),
        None => Box::new(LocalConnection::new()),
    }
}

fn changes_mounts(command: &Commands) -> bool {
    matches!(command, Commands::Mount { .. } | Commands::Umount { .. })
}

#[cfg(unix)]
fn warn_if_unprivileged(cli: &Cli) {
    if changes_mounts(&cli.command)
        && cli.ssh.is_none()
        && !cli.sudo
        && !cli.dry_run
        && !nix::unistd::Uid::effective().is_root()
    {
        tracing::warn!("not running as root, mount commands will probably fail (try --sudo)");
    }
}

#[cfg(not(unix))]
fn warn_if_unprivileged(_cli: &Cli) {}

/// Runs the command against a recorder and prints what would have run.
fn dry_run(command: &Commands, conn: &dyn Connection, out: &mut dyn Write) -> Result<(), Error> {
    let mut recorder = DryRunConnection::new(conn);
    if let Commands::Mount {
        password: Some(password),
        ..
    } = command
    {
        recorder = recorder.masking(password.clone());
    }

    execute(command, &recorder, out)?;

    for line in recorder.commands() {
        writeln!(out, "{line}").context(OutputSnafu)?;
    }
    for path in recorder.written_files() {
        writeln!(out, "# would update {path}").context(OutputSnafu)?;
    }
    Ok(())
}

fn execute(command: &Commands, conn: &dyn Connection, out: &mut dyn Write) -> Result<(), Error> {
    match command {
        Commands::Mount {
            fs,
            share,
            mount_point,
            username,
            password,
            params,
            credential_file,
        } => {
            let mut mount = Mount::new(conn);
            if let Some(path) = credential_file {
                mount = mount.with_credential_file(path.clone());
            }
            mount_share(
                &mount,
                *fs,
                share,
                mount_point,
                username.as_deref(),
                password.as_deref(),
                params.as_deref(),
            )
        }
        Commands::Umount { mount_point } => Mount::new(conn)
            .umount(mount_point)
            .context(CoreSnafu { action: "unmount" }),
        Commands::Status { mount_point } => {
            let mount = Mount::new(conn);
            let status = MountStatus {
                mount_point,
                os: mount.os(),
                mounted: mount.is_mounted(mount_point),
            };
            serde_json::to_writer_pretty(&mut *out, &status).context(JsonSnafu)?;
            writeln!(out).context(OutputSnafu)
        }
        Commands::Os => {
            let os = conn.os_name().context(OsQuerySnafu)?;
            writeln!(out, "{os}").context(OutputSnafu)
        }
    }
}

fn mount_share(
    mount: &dyn FsMount,
    fs: FsType,
    share: &str,
    mount_point: &str,
    username: Option<&str>,
    password: Option<&str>,
    params: Option<&str>,
) -> Result<(), Error> {
    let result = match fs {
        FsType::Nfs => mount.mount_nfs(mount_point, share, username, password),
        FsType::Cifs => mount.mount_cifs(mount_point, share, username, password),
        FsType::Sshfs => {
            let username = username.context(MissingOptionSnafu {
                fs_type: fs,
                option: "username",
            })?;
            let password = password.context(MissingOptionSnafu {
                fs_type: fs,
                option: "password",
            })?;
            mount.mount_sshfs(mount_point, share, username, password)
        }
        FsType::Tmpfs => mount.mount_tmpfs(mount_point, share, params),
        FsType::Hugetlbfs => mount.mount_hugetlbfs(mount_point, share, params),
    };
    result.context(CoreSnafu { action: "mount" })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use clap::Parser;
    use remote_mount_core::CommandOutput;

    use super::*;

    /// Host stub that reports a fixed OS and records commands.
    struct StubHost {
        os: OsName,
        stdout: &'static str,
        commands: RefCell<Vec<String>>,
    }

    impl StubHost {
        fn new(os: OsName) -> Self {
            Self {
                os,
                stdout: "",
                commands: RefCell::new(Vec::new()),
            }
        }

        fn commands(&self) -> Vec<String> {
            self.commands.borrow().clone()
        }
    }

    impl Connection for StubHost {
        fn execute_command(&self, command: &str, _shell: bool) -> Result<CommandOutput, CommandError> {
            self.commands.borrow_mut().push(command.to_string());
            Ok(CommandOutput::new(0, self.stdout, ""))
        }

        fn os_name(&self) -> Result<OsName, CommandError> {
            Ok(self.os.clone())
        }

        fn read_text(&self, _path: &str) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }

        fn write_text(&self, _path: &str, _content: &str) -> io::Result<()> {
            Ok(())
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("remote-mount").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_mount_nfs_from_args() {
        let cli = parse(&["mount", "nfs", "10.10.10.10:/to_share", "/mnt/shared", "-u", "admin"]);
        let host = StubHost::new(OsName::Linux);
        execute(&cli.command, &host, &mut Vec::new()).unwrap();
        assert_eq!(
            host.commands(),
            vec!["mount -t nfs -o username=admin 10.10.10.10:/to_share /mnt/shared"]
        );
    }

    #[test]
    fn test_smb_alias_and_hyphenated_params() {
        let cli = parse(&["mount", "smb", "//10.10.10.10/to_share", "/mnt/c"]);
        assert!(matches!(cli.command, Commands::Mount { fs: FsType::Cifs, .. }));

        let cli = parse(&["mount", "tmpfs", "none", "/mnt/t", "--params", "-o size=1G"]);
        let host = StubHost::new(OsName::Linux);
        execute(&cli.command, &host, &mut Vec::new()).unwrap();
        assert_eq!(host.commands(), vec!["mount -t tmpfs -o size=1G none /mnt/t"]);
    }

    #[test]
    fn test_unknown_fs_is_rejected() {
        let result = Cli::try_parse_from(["remote-mount", "mount", "ext4", "/dev/sda1", "/mnt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sshfs_requires_credentials() {
        let cli = parse(&["mount", "sshfs", "10.10.10.10:/to_share", "/mnt/s", "-u", "root"]);
        let host = StubHost::new(OsName::Linux);
        let err = execute(&cli.command, &host, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "SSHFS mount requires --password");
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_status_prints_json() {
        let cli = parse(&["status", "Z:"]);
        let host = StubHost::new(OsName::Windows);
        let mut out = Vec::new();
        execute(&cli.command, &host, &mut out).unwrap();

        let status: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(status["mount_point"], "Z:");
        assert_eq!(status["os"], "windows");
        assert_eq!(status["mounted"], true);
        assert_eq!(host.commands(), vec!["net use Z:"]);
    }

    #[test]
    fn test_os_prints_family() {
        let host = StubHost::new(OsName::Esxi);
        let mut out = Vec::new();
        execute(&Commands::Os, &host, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ESXi\n");
    }

    #[test]
    fn test_unsupported_mount_reports_core_error() {
        let cli = parse(&["mount", "cifs", "//10.10.10.10/to_share", "shared"]);
        let host = StubHost::new(OsName::Esxi);
        let err = execute(&cli.command, &host, &mut Vec::new()).unwrap_err();
        let report = snafu::Report::from_error(err).to_string();
        assert!(report.contains("CIFS mount is not supported for ESXi. Use other mount method."));
    }

    #[test]
    fn test_dry_run_masks_password() {
        let cli = parse(&[
            "--dry-run",
            "mount",
            "cifs",
            "//10.10.10.10/to_share",
            "/mnt/c",
            "-u",
            "admin",
            "-p",
            "hunter2",
        ]);
        let host = StubHost::new(OsName::Linux);
        let mut out = Vec::new();
        dry_run(&cli.command, &host, &mut out).unwrap();

        assert!(host.commands().is_empty());
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(
            printed,
            "mount -t cifs -o username=admin,password=***** //10.10.10.10/to_share /mnt/c\n"
        );
    }

    #[test]
    fn test_dry_run_windows_umount() {
        let cli = parse(&["--dry-run", "umount", "Z:"]);
        assert!(changes_mounts(&cli.command));
        let host = StubHost::new(OsName::Windows);
        let mut out = Vec::new();
        dry_run(&cli.command, &host, &mut out).unwrap();

        assert!(host.commands().is_empty());
        assert_eq!(String::from_utf8(out).unwrap(), "net use Z: /delete\n");
    }

    #[test]
    fn test_queries_are_not_dry_run() {
        assert!(!changes_mounts(&parse(&["--dry-run", "status", "/mnt"]).command));
        assert!(!changes_mounts(&parse(&["--dry-run", "os"]).command));
    }

    #[test]
    fn test_dry_run_lists_credential_file() {
        let cli = parse(&[
            "--dry-run",
            "mount",
            "cifs",
            "10.10.10.10/to_share",
            "/mnt/c",
            "-u",
            "foo",
            "-p",
            "pass",
            "--credential-file",
            "/root/.nsmbrc",
        ]);
        let host = StubHost::new(OsName::FreeBsd);
        let mut out = Vec::new();
        dry_run(&cli.command, &host, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("mount_smbfs -I 10.10.10.10 //foo@10.10.10.10/to_share /mnt/c\n"));
        assert!(printed.ends_with("# would update /root/.nsmbrc\n"));
    }
}
