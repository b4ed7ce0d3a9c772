//! Page to media relation extraction.
//!
//! The transfer engine needs to know which media files a page references so
//! it can carry them along. The host wiki keeps this in its rendered metadata
//! index; since that index is external to this tool, the shipped
//! implementation recovers the relation straight from the page body's
//! `{{...}}` embeds. The trait keeps the seam open for a host-backed source.

use std::path::Path;

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;

/// Source of the media identifiers referenced by a page
pub trait MediaRelations {
    /// Media referenced by the page body, in order of appearance
    fn media_for(&self, page_body_path: &Path) -> Result<Vec<Id>>;
}

/// Extracts media references from `{{...}}` embeds in page bodies
pub struct BodyMediaRelations<FS: FileSystem> {
    fs: FS,
}

impl<FS: FileSystem> BodyMediaRelations<FS> {
    /// Extract relations by reading page bodies from the given filesystem
    pub fn new(fs: FS) -> Self {
        Self { fs }
    }
}

impl<FS: FileSystem> MediaRelations for BodyMediaRelations<FS> {
    fn media_for(&self, page_body_path: &Path) -> Result<Vec<Id>> {
        let body = self
            .fs
            .read_to_string(page_body_path)
            .map_err(|source| SyncError::FileRead {
                path: page_body_path.to_path_buf(),
                source,
            })?;

        Ok(extract_media_ids(&body))
    }
}

/// Pull media identifiers out of `{{...}}` embeds.
///
/// External URLs, in-page anchors and tag selectors (`{{tag>...}}`) are not
/// media references and are skipped. Duplicates are dropped, keeping the
/// first occurrence.
pub fn extract_media_ids(body: &str) -> Vec<Id> {
    let mut result: Vec<Id> = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let inner = &after[..end];
        rest = &after[end + 2..];

        // Strip caption and size/query parameters.
        let target = inner.split('|').next().unwrap_or("");
        let target = target.split('?').next().unwrap_or("").trim();

        if target.is_empty()
            || target.contains("://")
            || target.starts_with('#')
            || target.contains('>')
        {
            continue;
        }

        let id = Id::new(target);
        if !id.as_str().is_empty() && !result.contains(&id) {
            result.push(id);
        }
    }

    result
}
