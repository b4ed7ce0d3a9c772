//! Content tree scanning.
//!
//! Recursively enumerates the pages of one content tree, producing an
//! identifier -> record map. Whole subtrees are skipped when their namespace
//! is excluded; the transfer log namespace is always excluded by callers
//! because it exists only on the client and would otherwise show up as
//! divergent on every comparison.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;

/// Extension of page body files
pub const PAGE_EXTENSION: &str = "txt";

/// One scanned page: ephemeral, recreated on every scan
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    /// Identifier derived from the path relative to the scan root
    pub id: Id,
    /// Modification time as unix seconds
    pub mtime: i64,
    /// Physical path of the page body
    pub path: PathBuf,
}

/// Convert a SystemTime to unix seconds
pub fn unix_secs(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Scans a page directory of one content tree
pub struct TreeScanner<FS: FileSystem> {
    fs: FS,
}

impl<FS: FileSystem> TreeScanner<FS> {
    /// Create a scanner over the given filesystem
    pub fn new(fs: FS) -> Self {
        Self { fs }
    }

    /// Enumerate all pages under `pages_root`, skipping excluded namespaces.
    ///
    /// `pages_root` is the `pages/` directory of a tree. The returned map is
    /// keyed by normalized identifier; iteration order is ascending by id.
    pub fn scan(&self, pages_root: &Path, excluded: &[Id]) -> Result<BTreeMap<Id, PageRecord>> {
        if !self.fs.is_dir(pages_root) {
            return Err(SyncError::ScanRoot(pages_root.to_path_buf()));
        }

        let mut results = BTreeMap::new();
        self.scan_dir(pages_root, "", excluded, &mut results)?;
        Ok(results)
    }

    fn scan_dir(
        &self,
        dir: &Path,
        namespace: &str,
        excluded: &[Id],
        results: &mut BTreeMap<Id, PageRecord>,
    ) -> Result<()> {
        if !namespace.is_empty() {
            let ns_id = Id::new(namespace);
            if excluded.contains(&ns_id) {
                return Ok(());
            }
        }

        for entry in self.fs.list_dir(dir)? {
            let Some(name) = entry.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };

            if self.fs.is_dir(&entry) {
                let sub_ns = if namespace.is_empty() {
                    name
                } else {
                    format!("{namespace}:{name}")
                };
                self.scan_dir(&entry, &sub_ns, excluded, results)?;
                continue;
            }

            let Some(page_name) = name.strip_suffix(&format!(".{PAGE_EXTENSION}")) else {
                continue;
            };

            // Best effort: a file that vanishes between listing and stat is
            // silently omitted.
            let mtime = match self.fs.modified(&entry) {
                Ok(t) => unix_secs(t),
                Err(e) => {
                    log::debug!("skipping {:?} during scan: {}", entry, e);
                    continue;
                }
            };

            let id = if namespace.is_empty() {
                Id::new(page_name)
            } else {
                Id::new(&format!("{namespace}:{page_name}"))
            };

            results.insert(
                id.clone(),
                PageRecord {
                    id,
                    mtime,
                    path: entry,
                },
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::time::Duration;

    fn write_page(fs: &InMemoryFileSystem, path: &str, mtime_secs: u64) {
        fs.write_file(Path::new(path), "body").unwrap();
        fs.set_modified(
            Path::new(path),
            UNIX_EPOCH + Duration::from_secs(mtime_secs),
        )
        .unwrap();
    }

    #[test]
    fn test_scan_builds_ids_from_paths() {
        let fs = InMemoryFileSystem::new();
        write_page(&fs, "/primary/pages/start.txt", 100);
        write_page(&fs, "/primary/pages/a/one.txt", 200);
        write_page(&fs, "/primary/pages/a/sub/deep.txt", 300);

        let scanner = TreeScanner::new(&fs);
        let pages = scanner.scan(Path::new("/primary/pages"), &[]).unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[&Id::new("start")].mtime, 100);
        assert_eq!(pages[&Id::new("a:one")].mtime, 200);
        assert_eq!(
            pages[&Id::new("a:sub:deep")].path,
            PathBuf::from("/primary/pages/a/sub/deep.txt")
        );
    }

    #[test]
    fn test_scan_ignores_non_page_files() {
        let fs = InMemoryFileSystem::new();
        write_page(&fs, "/primary/pages/start.txt", 100);
        fs.write_file(Path::new("/primary/pages/notes.bak"), "x").unwrap();

        let scanner = TreeScanner::new(&fs);
        let pages = scanner.scan(Path::new("/primary/pages"), &[]).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_scan_skips_excluded_namespace_subtree() {
        let fs = InMemoryFileSystem::new();
        write_page(&fs, "/client/pages/a/one.txt", 100);
        write_page(&fs, "/client/pages/log/transfers/1700000000.txt", 200);
        write_page(&fs, "/client/pages/log/other.txt", 300);

        let scanner = TreeScanner::new(&fs);
        let pages = scanner
            .scan(Path::new("/client/pages"), &[Id::new("log:transfers")])
            .unwrap();

        assert!(pages.contains_key(&Id::new("a:one")));
        assert!(pages.contains_key(&Id::new("log:other")));
        assert!(!pages.contains_key(&Id::new("log:transfers:1700000000")));
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let fs = InMemoryFileSystem::new();
        let scanner = TreeScanner::new(&fs);
        let err = scanner.scan(Path::new("/nowhere/pages"), &[]).unwrap_err();
        assert!(matches!(err, SyncError::ScanRoot(_)));
    }
}
