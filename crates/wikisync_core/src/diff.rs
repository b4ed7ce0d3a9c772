//! Divergence detection between the primary and client trees.
//!
//! Two tests with different jobs:
//!
//! - [`divergences`] compares scan results by modification time. Cheap, used
//!   for the interactive listing only.
//! - [`content_equal`] hashes file contents (blake3). Authoritative, and the
//!   only test that gates an actual transfer: timestamps are mutated by the
//!   transfer itself, so they cannot be trusted to decide re-transfers.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;
use crate::scan::PageRecord;

/// Why an identifier shows up in the divergence listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceReason {
    /// Exists in primary only (new content)
    MissingInClient,
    /// Exists in client only (candidate deletion at primary)
    MissingInPrimary,
    /// Present in both with differing modification times
    Modified,
}

/// One entry of the divergence listing
#[derive(Debug, Clone, Serialize)]
pub struct Divergence {
    /// The diverging identifier
    pub id: Id,
    /// Why it diverges
    pub reason: DivergenceReason,
    /// Modification time in the primary tree, if present there
    pub primary_mtime: Option<i64>,
    /// Modification time in the client tree, if present there
    pub client_mtime: Option<i64>,
}

/// Compare two scan results and list every identifier that differs.
///
/// Identifiers present in both trees with equal modification times are
/// omitted. The result is sorted by identifier.
pub fn divergences(
    primary: &BTreeMap<Id, PageRecord>,
    client: &BTreeMap<Id, PageRecord>,
) -> Vec<Divergence> {
    let mut result = Vec::new();

    for (id, p) in primary {
        match client.get(id) {
            None => result.push(Divergence {
                id: id.clone(),
                reason: DivergenceReason::MissingInClient,
                primary_mtime: Some(p.mtime),
                client_mtime: None,
            }),
            Some(c) if c.mtime != p.mtime => result.push(Divergence {
                id: id.clone(),
                reason: DivergenceReason::Modified,
                primary_mtime: Some(p.mtime),
                client_mtime: Some(c.mtime),
            }),
            Some(_) => {}
        }
    }

    for (id, c) in client {
        if !primary.contains_key(id) {
            result.push(Divergence {
                id: id.clone(),
                reason: DivergenceReason::MissingInPrimary,
                primary_mtime: None,
                client_mtime: Some(c.mtime),
            });
        }
    }

    result.sort_by(|a, b| a.id.cmp(&b.id));
    result
}

/// Authoritative content equality: blake3 over file bytes.
///
/// A missing file hashes as empty content, so two missing files (and a
/// missing file vs. an empty one) compare equal.
pub fn content_equal<FS: FileSystem>(fs: &FS, one: &Path, two: &Path) -> Result<bool> {
    Ok(content_hash(fs, one)? == content_hash(fs, two)?)
}

fn content_hash<FS: FileSystem>(fs: &FS, path: &Path) -> Result<blake3::Hash> {
    if !fs.exists(path) {
        return Ok(blake3::hash(b""));
    }
    let bytes = fs.read_binary(path).map_err(|source| SyncError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(blake3::hash(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::path::PathBuf;

    fn record(id: &str, mtime: i64) -> (Id, PageRecord) {
        let id = Id::new(id);
        (
            id.clone(),
            PageRecord {
                id,
                mtime,
                path: PathBuf::from("unused"),
            },
        )
    }

    #[test]
    fn test_divergences_cover_all_three_reasons() {
        let primary: BTreeMap<_, _> =
            [record("both:same", 10), record("both:changed", 20), record("only:primary", 30)]
                .into_iter()
                .collect();
        let client: BTreeMap<_, _> =
            [record("both:same", 10), record("both:changed", 25), record("only:client", 40)]
                .into_iter()
                .collect();

        let divs = divergences(&primary, &client);
        assert_eq!(divs.len(), 3);

        let by_id: BTreeMap<_, _> = divs.iter().map(|d| (d.id.clone(), d.reason)).collect();
        assert_eq!(by_id[&Id::new("both:changed")], DivergenceReason::Modified);
        assert_eq!(
            by_id[&Id::new("only:primary")],
            DivergenceReason::MissingInClient
        );
        assert_eq!(
            by_id[&Id::new("only:client")],
            DivergenceReason::MissingInPrimary
        );
    }

    #[test]
    fn test_divergences_sorted_by_id() {
        let primary: BTreeMap<_, _> = [record("z", 1), record("a", 2)].into_iter().collect();
        let client = BTreeMap::new();

        let divs = divergences(&primary, &client);
        assert_eq!(divs[0].id, Id::new("a"));
        assert_eq!(divs[1].id, Id::new("z"));
    }

    #[test]
    fn test_content_equal_same_bytes() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("/a.txt"), "same").unwrap();
        fs.write_file(Path::new("/b.txt"), "same").unwrap();
        fs.write_file(Path::new("/c.txt"), "different").unwrap();

        assert!(content_equal(&fs, Path::new("/a.txt"), Path::new("/b.txt")).unwrap());
        assert!(!content_equal(&fs, Path::new("/a.txt"), Path::new("/c.txt")).unwrap());
    }

    #[test]
    fn test_content_equal_missing_is_empty() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("/empty.txt"), "").unwrap();
        fs.write_file(Path::new("/full.txt"), "x").unwrap();

        // missing vs missing
        assert!(content_equal(&fs, Path::new("/no1"), Path::new("/no2")).unwrap());
        // missing vs empty file
        assert!(content_equal(&fs, Path::new("/no1"), Path::new("/empty.txt")).unwrap());
        // missing vs content
        assert!(!content_equal(&fs, Path::new("/no1"), Path::new("/full.txt")).unwrap());
    }
}
