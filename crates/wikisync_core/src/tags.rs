//! Tag index: which pages carry which tag.
//!
//! Transfers are selected by tag. The host wiki maintains its own tag index;
//! the shipped implementation scans page bodies for `{{tag>...}}` markers
//! instead, so the tool works against a bare tree. The trait keeps the seam
//! open for an index-backed source.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;
use crate::scan::PageRecord;

/// Maps tags to the pages that carry them
pub trait TagIndex {
    /// Pages tagged with the given label
    fn pages_tagged(&self, tag: &str) -> Result<BTreeSet<Id>>;

    /// All known tags with the number of pages carrying each
    fn all_tags(&self) -> Result<BTreeMap<String, usize>>;
}

/// Tag index built by scanning page bodies for `{{tag>...}}` markers
pub struct BodyTagIndex {
    /// page id -> tags found in its body
    by_page: BTreeMap<Id, BTreeSet<String>>,
}

impl BodyTagIndex {
    /// Build the index over a scan result by reading every page body
    pub fn build<FS: FileSystem>(fs: &FS, pages: &BTreeMap<Id, PageRecord>) -> Result<Self> {
        let mut by_page = BTreeMap::new();
        for (id, record) in pages {
            let body = fs
                .read_to_string(&record.path)
                .map_err(|source| SyncError::FileRead {
                    path: record.path.clone(),
                    source,
                })?;
            let tags = extract_tags(&body);
            if !tags.is_empty() {
                by_page.insert(id.clone(), tags);
            }
        }
        Ok(Self { by_page })
    }

    /// Tags of one page, empty if the page carries none
    pub fn tags_for(&self, id: &Id) -> BTreeSet<String> {
        self.by_page.get(id).cloned().unwrap_or_default()
    }
}

impl TagIndex for BodyTagIndex {
    fn pages_tagged(&self, tag: &str) -> Result<BTreeSet<Id>> {
        let wanted = tag.to_lowercase();
        Ok(self
            .by_page
            .iter()
            .filter(|(_, tags)| tags.contains(&wanted))
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn all_tags(&self) -> Result<BTreeMap<String, usize>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for tags in self.by_page.values() {
            for tag in tags {
                *counts.entry(tag.clone()).or_default() += 1;
            }
        }
        Ok(counts)
    }
}

/// Collect the tags of one page body from its `{{tag>...}}` markers
pub fn extract_tags(body: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    let mut rest = body;

    while let Some(start) = rest.find("{{tag>") {
        let after = &rest[start + "{{tag>".len()..];
        let Some(end) = after.find("}}") else {
            break;
        };
        for token in after[..end].split_whitespace() {
            tags.insert(token.to_lowercase());
        }
        rest = &after[end + 2..];
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::path::{Path, PathBuf};

    fn pages_fixture(fs: &InMemoryFileSystem) -> BTreeMap<Id, PageRecord> {
        let mut pages = BTreeMap::new();
        for (id, path, body) in [
            ("a:one", "/p/pages/a/one.txt", "Body\n{{tag>release internal}}\n"),
            ("a:two", "/p/pages/a/two.txt", "Untagged body\n"),
            ("b:three", "/p/pages/b/three.txt", "{{tag>Release}}\n"),
        ] {
            fs.write_file(Path::new(path), body).unwrap();
            let id = Id::new(id);
            pages.insert(
                id.clone(),
                PageRecord {
                    id,
                    mtime: 0,
                    path: PathBuf::from(path),
                },
            );
        }
        pages
    }

    #[test]
    fn test_extract_tags() {
        let tags = extract_tags("x {{tag>one two}} y {{tag>Three}}");
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["one", "three", "two"]
        );
    }

    #[test]
    fn test_pages_tagged_is_case_insensitive() {
        let fs = InMemoryFileSystem::new();
        let pages = pages_fixture(&fs);
        let index = BodyTagIndex::build(&fs, &pages).unwrap();

        let tagged = index.pages_tagged("RELEASE").unwrap();
        assert_eq!(
            tagged.into_iter().collect::<Vec<_>>(),
            vec![Id::new("a:one"), Id::new("b:three")]
        );
    }

    #[test]
    fn test_all_tags_counts_pages() {
        let fs = InMemoryFileSystem::new();
        let pages = pages_fixture(&fs);
        let index = BodyTagIndex::build(&fs, &pages).unwrap();

        let tags = index.all_tags().unwrap();
        assert_eq!(tags["release"], 2);
        assert_eq!(tags["internal"], 1);
    }
}
