//! Transfer journal and sync anchor.
//!
//! Every run writes a human-readable log page into a dedicated namespace of
//! the client tree, named by the run timestamp. The page doubles as the sync
//! anchor: the greatest numeric page name in the log namespace is the
//! timestamp of the most recent completed transfer.

use std::path::PathBuf;

use crate::address::TreeAddress;
use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;

/// Append-only journal of one transfer run
pub struct SyncLog<FS: FileSystem> {
    fs: FS,
    page_path: PathBuf,
    run_timestamp: i64,
    summary: String,
}

impl<FS: FileSystem> SyncLog<FS> {
    /// Journal for a run at `run_timestamp`, stored in the client tree's log
    /// namespace. Nothing is written until the first append.
    pub fn new(
        fs: FS,
        client: &TreeAddress,
        log_namespace: &Id,
        run_timestamp: i64,
        summary: &str,
    ) -> Self {
        let page_path = client
            .namespace_dir(log_namespace)
            .join(format!("{run_timestamp}.txt"));
        Self {
            fs,
            page_path,
            run_timestamp,
            summary: summary.to_string(),
        }
    }

    /// Path of this run's log page
    pub fn page_path(&self) -> &std::path::Path {
        &self.page_path
    }

    /// Record a replaced page
    pub fn page_replaced(&self, id: &Id) -> Result<()> {
        self.append(&format!(
            "The page [[:{id}]] was replaced by a new version. \
             Its meta information and changelog were also replaced."
        ))
    }

    /// Record a deleted page
    pub fn page_deleted(&self, id: &Id) -> Result<()> {
        self.append(&format!(
            "The page [[:{id}]] was deleted, following its deletion in the primary wiki."
        ))
    }

    /// Record a replaced media file
    pub fn media_replaced(&self, id: &Id) -> Result<()> {
        self.append(&format!(
            "The media file {{{{:{id}?linkonly}}}} was replaced by a new version. \
             Its changelog was also replaced."
        ))
    }

    /// Record a media file skipped because it was already transferred in
    /// this run
    pub fn media_skipped(&self, id: &Id) -> Result<()> {
        self.append(&format!(
            "The media file {{{{:{id}?linkonly}}}} was skipped, \
             because it already had been transferred."
        ))
    }

    fn append(&self, line: &str) -> Result<()> {
        if !self.fs.exists(&self.page_path) {
            self.write_header()?;
        }
        self.fs
            .append_file(&self.page_path, &format!("  * {line}\n"))
            .map_err(|source| SyncError::FileWrite {
                path: self.page_path.clone(),
                source,
            })
    }

    fn write_header(&self) -> Result<()> {
        if let Some(parent) = self.page_path.parent() {
            self.fs.create_dir_all(parent)?;
        }

        let date = chrono::DateTime::from_timestamp(self.run_timestamp, 0)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| self.run_timestamp.to_string());

        let header = format!(
            "====== Log of page update \"{}\" ======\n\nDate of export: {}\n\n",
            self.summary, date
        );
        self.fs
            .write_file(&self.page_path, &header)
            .map_err(|source| SyncError::FileWrite {
                path: self.page_path.clone(),
                source,
            })
    }
}

/// Timestamp of the most recent recorded transfer, or 0 if none exists.
///
/// Derived, not stored: the greatest all-digit page name in the client
/// tree's log namespace. Non-numeric pages in the namespace are ignored, so
/// operator notes cannot corrupt the anchor.
pub fn last_anchor<FS: FileSystem>(
    fs: &FS,
    client: &TreeAddress,
    log_namespace: &Id,
) -> Result<i64> {
    let dir = client.namespace_dir(log_namespace);
    if !fs.is_dir(&dir) {
        return Ok(0);
    }

    let mut anchor = 0;
    for entry in fs.list_dir(&dir)? {
        let Some(name) = entry.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let Some(stem) = name.strip_suffix(".txt") else {
            continue;
        };
        if let Ok(ts) = stem.parse::<i64>() {
            anchor = anchor.max(ts);
        }
    }
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::path::Path;

    fn setup() -> (InMemoryFileSystem, TreeAddress, Id) {
        (
            InMemoryFileSystem::new(),
            TreeAddress::new("/client"),
            Id::new("log:transfers"),
        )
    }

    #[test]
    fn test_header_written_once_then_bullets() {
        let (fs, client, ns) = setup();
        let log = SyncLog::new(&fs, &client, &ns, 1700000000, "october release");

        log.page_replaced(&Id::new("a:one")).unwrap();
        log.media_replaced(&Id::new("shared:logo.png")).unwrap();

        let content = fs
            .read_to_string(Path::new("/client/pages/log/transfers/1700000000.txt"))
            .unwrap();
        assert!(content.starts_with("====== Log of page update \"october release\" ======\n"));
        assert!(content.contains("Date of export: "));
        assert!(content.contains("  * The page [[:a:one]] was replaced"));
        assert!(content.contains("  * The media file {{:shared:logo.png?linkonly}} was replaced"));
        assert_eq!(content.matches("======").count(), 2);
    }

    #[test]
    fn test_last_anchor_is_greatest_numeric_page() {
        let (fs, client, ns) = setup();
        fs.write_file(Path::new("/client/pages/log/transfers/100.txt"), "x").unwrap();
        fs.write_file(Path::new("/client/pages/log/transfers/250.txt"), "x").unwrap();
        fs.write_file(Path::new("/client/pages/log/transfers/notes.txt"), "x").unwrap();

        assert_eq!(last_anchor(&fs, &client, &ns).unwrap(), 250);
    }

    #[test]
    fn test_last_anchor_empty_namespace_is_epoch() {
        let (fs, client, ns) = setup();
        assert_eq!(last_anchor(&fs, &client, &ns).unwrap(), 0);
    }
}
