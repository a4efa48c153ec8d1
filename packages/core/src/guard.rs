//! Scoped mounts that unmount when they go out of scope.

use crate::error::Result;
use crate::mount::FsMount;

/// A successful mount that is undone when the guard is released or dropped.
///
/// Dropping the guard (including during a panic unwind) runs `umount` and
/// logs a failure; call [`unmount`](Self::unmount) to observe the result.
#[must_use = "the share is unmounted as soon as the guard is dropped"]
pub struct MountGuard<'m, M: FsMount + ?Sized> {
    mount: &'m M,
    mount_point: String,
    released: bool,
}

impl<'m, M: FsMount + ?Sized> MountGuard<'m, M> {
    fn new(mount: &'m M, mount_point: &str) -> Self {
        Self {
            mount,
            mount_point: mount_point.to_string(),
            released: false,
        }
    }

    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    /// Unmounts now and reports the outcome.
    pub fn unmount(mut self) -> Result<()> {
        self.released = true;
        self.mount.umount(&self.mount_point)
    }
}

impl<M: FsMount + ?Sized> Drop for MountGuard<'_, M> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.mount.umount(&self.mount_point) {
            tracing::warn!(mount_point = %self.mount_point, error = %e, "failed to unmount on scope exit");
        }
    }
}

/// Scoped variants of every [`FsMount`] operation.
///
/// A failed mount returns the error and no guard, so nothing is unmounted.
///
/// ```no_run
/// use remote_mount_core::guard::ScopedMount;
/// use remote_mount_core::local::LocalConnection;
/// use remote_mount_core::mount::{FsMount, Mount};
///
/// let conn = LocalConnection::with_sudo();
/// let mount = Mount::new(&conn);
/// {
///     let _share = mount.scoped_nfs("/mnt/shared", "10.10.10.10:/shared", None, None)?;
///     assert!(mount.is_mounted("/mnt/shared"));
/// } // unmounted here
/// # Ok::<(), remote_mount_core::Error>(())
/// ```
pub trait ScopedMount: FsMount {
    fn scoped_nfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<MountGuard<'_, Self>> {
        self.mount_nfs(mount_point, share_path, username, password)?;
        Ok(MountGuard::new(self, mount_point))
    }

    fn scoped_cifs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<MountGuard<'_, Self>> {
        self.mount_cifs(mount_point, share_path, username, password)?;
        Ok(MountGuard::new(self, mount_point))
    }

    fn scoped_sshfs(
        &self,
        mount_point: &str,
        share_path: &str,
        username: &str,
        password: &str,
    ) -> Result<MountGuard<'_, Self>> {
        self.mount_sshfs(mount_point, share_path, username, password)?;
        Ok(MountGuard::new(self, mount_point))
    }

    fn scoped_tmpfs(
        &self,
        mount_point: &str,
        share_path: &str,
        params: Option<&str>,
    ) -> Result<MountGuard<'_, Self>> {
        self.mount_tmpfs(mount_point, share_path, params)?;
        Ok(MountGuard::new(self, mount_point))
    }

    fn scoped_hugetlbfs(
        &self,
        mount_point: &str,
        share_path: &str,
        params: Option<&str>,
    ) -> Result<MountGuard<'_, Self>> {
        self.mount_hugetlbfs(mount_point, share_path, params)?;
        Ok(MountGuard::new(self, mount_point))
    }
}

impl<T: FsMount + ?Sized> ScopedMount for T {}
