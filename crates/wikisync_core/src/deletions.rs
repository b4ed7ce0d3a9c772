//! Deletion detection against the primary tree's global changelog.
//!
//! The host wiki appends every content mutation to a global changelog. To
//! propagate deletions, a transfer run asks for all `D` entries recorded
//! since the last sync anchor. Deletions are only ever resolved during
//! transfer preparation, never shown in the passive comparison view.

use std::path::PathBuf;

use crate::changelog::{ChangeEntry, ChangeOp};
use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;

/// Source of the primary tree's mutation history
pub trait ChangeProvider {
    /// All changelog entries with a timestamp strictly greater than `since`,
    /// in log order.
    fn changes_since(&self, since: i64) -> Result<Vec<ChangeEntry>>;
}

/// Reads the global changelog from a file in the primary tree
pub struct FileChangeProvider<FS: FileSystem> {
    fs: FS,
    path: PathBuf,
}

impl<FS: FileSystem> FileChangeProvider<FS> {
    /// Read from the given changelog file
    pub fn new(fs: FS, path: impl Into<PathBuf>) -> Self {
        Self { fs, path: path.into() }
    }
}

impl<FS: FileSystem> ChangeProvider for FileChangeProvider<FS> {
    fn changes_since(&self, since: i64) -> Result<Vec<ChangeEntry>> {
        if !self.fs.exists(&self.path) {
            // A wiki that never recorded a change has no changelog file.
            return Ok(Vec::new());
        }

        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|source| SyncError::FileRead {
                path: self.path.clone(),
                source,
            })?;

        let mut entries = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match ChangeEntry::parse(line) {
                Ok(entry) if entry.timestamp > since => entries.push(entry),
                Ok(_) => {}
                Err(e) => log::warn!("ignoring changelog line in {:?}: {}", self.path, e),
            }
        }
        Ok(entries)
    }
}

/// Identifiers deleted since the anchor, in changelog order.
///
/// A deletion followed by a later recreation of the same identifier is not
/// pending anymore and is dropped from the result.
pub fn deletions_since<P: ChangeProvider>(provider: &P, anchor: i64) -> Result<Vec<Id>> {
    let mut pending: Vec<Id> = Vec::new();

    for entry in provider.changes_since(anchor)? {
        match entry.op {
            ChangeOp::Delete => {
                if !pending.contains(&entry.id) {
                    pending.push(entry.id);
                }
            }
            _ => pending.retain(|id| *id != entry.id),
        }
    }

    Ok(pending)
}
