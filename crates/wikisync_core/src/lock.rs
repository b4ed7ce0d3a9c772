//! Run-scoped client tree lock.
//!
//! Two simultaneous transfer runs against the same client tree would race on
//! changelog appends and log page creation, so a run holds an advisory lock
//! file in the client root for its whole duration.

use std::path::PathBuf;

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;

/// Name of the lock file inside the client tree root
pub const LOCK_FILE: &str = ".wikisync.lock";

/// Advisory lock on a client tree, released on drop
pub struct RunLock<FS: FileSystem> {
    fs: FS,
    path: PathBuf,
}

impl<FS: FileSystem> RunLock<FS> {
    /// Acquire the lock, failing immediately if another run holds it.
    ///
    /// The lock file records the acquiring timestamp so a stale lock left by
    /// a crashed run can be identified and removed by the operator.
    pub fn acquire(fs: FS, client_root: &std::path::Path, timestamp: i64) -> Result<Self> {
        let path = client_root.join(LOCK_FILE);
        match fs.create_new(&path, &format!("{timestamp}\n")) {
            Ok(()) => Ok(Self { fs, path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(SyncError::Locked(path))
            }
            Err(e) => Err(SyncError::FileWrite { path, source: e }),
        }
    }
}

impl<FS: FileSystem> Drop for RunLock<FS> {
    fn drop(&mut self) {
        if let Err(e) = self.fs.delete_file(&self.path) {
            log::warn!("failed to remove lock file {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::path::Path;

    #[test]
    fn test_lock_is_exclusive_and_released_on_drop() {
        let fs = InMemoryFileSystem::new();
        let root = Path::new("/client");

        let lock = RunLock::acquire(&fs, root, 100).unwrap();
        assert!(fs.exists(Path::new("/client/.wikisync.lock")));

        let second = RunLock::acquire(&fs, root, 101);
        assert!(matches!(second, Err(SyncError::Locked(_))));

        drop(lock);
        assert!(!fs.exists(Path::new("/client/.wikisync.lock")));

        // Lock can be re-acquired after release.
        let third = RunLock::acquire(&fs, root, 102);
        assert!(third.is_ok());
    }
}
