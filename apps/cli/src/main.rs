//! remote-mount CLI - Mount shares on this machine or on a host reachable
//! over SSH.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use remote_mount_core::FsType;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Remote mount CLI tool.
#[derive(Parser)]
#[command(name = "remote-mount")]
#[command(about = "Mount NFS, CIFS, SSHFS, tmpfs and hugetlbfs on local or remote hosts", long_about = None)]
pub struct Cli {
    /// Run commands on this SSH destination (`user@host`) instead of locally.
    #[arg(long, global = true, env = "REMOTE_MOUNT_SSH")]
    pub ssh: Option<String>,

    /// SSH port.
    #[arg(long, global = true, requires = "ssh")]
    pub port: Option<u16>,

    /// SSH identity file.
    #[arg(long, global = true, requires = "ssh")]
    pub identity: Option<PathBuf>,

    /// Wrap local commands in sudo.
    #[arg(long, global = true, conflicts_with = "ssh")]
    pub sudo: bool,

    /// Print the commands that would run instead of running them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mount a share.
    Mount {
        /// Filesystem type: nfs, cifs (smb), sshfs, tmpfs or hugetlbfs.
        #[arg(value_parser = parse_fs_type)]
        fs: FsType,

        /// Share address, e.g. `10.10.10.10:/export` or `//server/share`.
        share: String,

        /// Mount point: a path, a drive letter (Windows) or a volume label (ESXi).
        mount_point: String,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long, env = "REMOTE_MOUNT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Extra arguments for tmpfs and hugetlbfs, e.g. `-o size=1G`.
        #[arg(long, allow_hyphen_values = true)]
        params: Option<String>,

        /// SMB credential file used on FreeBSD (default `/etc/nsmb.conf`).
        #[arg(long)]
        credential_file: Option<String>,
    },

    /// Unmount a mount point.
    Umount { mount_point: String },

    /// Report whether something is mounted, as JSON.
    Status { mount_point: String },

    /// Print the OS family of the target host.
    Os,
}

fn parse_fs_type(value: &str) -> Result<FsType, String> {
    FsType::try_from(value).map_err(|e| e.to_string())
}

fn main() {
    // Logs go to stderr so stdout stays machine-readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "remote_mount=info,remote_mount_core=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(&cli) {
        eprintln!("Error: {}", snafu::Report::from_error(e));
        std::process::exit(1);
    }
}
