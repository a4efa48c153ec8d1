//! remote-mount-core: Mount network and virtual filesystems on remote hosts.
//!
//! Commands are built per OS family and run through a [`Connection`], which
//! may be the local machine, an SSH session, or a dry-run recorder.
//!
//! # Modules
//!
//! - [`executor`]: Connection trait, command builder with secret redaction
//! - [`local`], [`ssh`]: Connections to this machine and to SSH hosts
//! - [`dry_run`]: Connection that records instead of executing
//! - [`mount`]: Mount operations for Linux, FreeBSD, Windows, ESXi and others
//! - [`guard`]: Scoped mounts that unmount on drop
//! - [`share`]: Share address parsing
//! - [`nsmb`]: FreeBSD SMB credential file handling
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use remote_mount_core::{FsMount, LocalConnection, Mount, ScopedMount};
//!
//! let conn = LocalConnection::with_sudo();
//! let mount = Mount::new(&conn);
//!
//! let share = mount.scoped_cifs("/mnt/shared", "//10.10.10.10/shared", Some("admin"), Some("pass"))?;
//! assert!(mount.is_mounted(share.mount_point()));
//! share.unmount()?;
//! # Ok::<(), remote_mount_core::Error>(())
//! ```

pub mod dry_run;
pub mod error;
pub mod executor;
pub mod fs_type;
pub mod guard;
pub mod local;
pub mod mount;
pub mod nsmb;
pub mod os;
pub mod share;
pub mod ssh;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use dry_run::DryRunConnection;
pub use error::{CommandError, Error, Result};
pub use executor::{CommandOutput, Connection};
pub use fs_type::FsType;
pub use guard::{MountGuard, ScopedMount};
pub use local::{LocalConnection, PrivilegeEscalation};
pub use mount::{FsMount, Mount};
pub use os::OsName;
pub use ssh::SshConnection;
