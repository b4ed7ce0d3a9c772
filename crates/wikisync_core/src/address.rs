//! Artifact path resolution.
//!
//! Maps a logical [`Id`] to every physical file that belongs to it inside one
//! content tree. This is a pure string transformation: no I/O happens here.

use std::path::PathBuf;

use serde::Serialize;

use crate::id::Id;

/// The physical artifacts that can belong to one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Page body text (`pages/<id>.txt`)
    Page,
    /// Media binary (`media/<id>`)
    Media,
    /// Metadata blob (`meta/<id>.meta`), copied verbatim
    Meta,
    /// Per-page changelog (`meta/<id>.changes`)
    Changelog,
    /// Per-media changelog (`media_meta/<id>.changes`)
    MediaChangelog,
    /// Optional page header (`header/<id>.txt`)
    Header,
}

impl ArtifactKind {
    /// Top-level directory for this artifact kind
    fn directory(self) -> &'static str {
        match self {
            ArtifactKind::Page => "pages",
            ArtifactKind::Media => "media",
            ArtifactKind::Meta => "meta",
            ArtifactKind::Changelog => "meta",
            ArtifactKind::MediaChangelog => "media_meta",
            ArtifactKind::Header => "header",
        }
    }

    /// File suffix for this artifact kind
    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Page => ".txt",
            ArtifactKind::Media => "",
            ArtifactKind::Meta => ".meta",
            ArtifactKind::Changelog => ".changes",
            ArtifactKind::MediaChangelog => ".changes",
            ArtifactKind::Header => ".txt",
        }
    }
}

/// Resolves identifiers to physical paths within one content tree
#[derive(Debug, Clone)]
pub struct TreeAddress {
    root: PathBuf,
}

impl TreeAddress {
    /// Address artifacts relative to the given tree root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The tree root this address resolves against
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Physical path of one artifact of the given identifier
    pub fn resolve(&self, id: &Id, kind: ArtifactKind) -> PathBuf {
        let mut file = id.to_path_fragment().into_os_string();
        file.push(kind.suffix());
        self.root.join(kind.directory()).join(file)
    }

    /// Directory holding the pages of the given namespace
    pub fn namespace_dir(&self, namespace: &Id) -> PathBuf {
        self.root.join("pages").join(namespace.to_path_fragment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_resolve_page_artifacts() {
        let addr = TreeAddress::new("/client");
        let id = Id::new("a:one");

        assert_eq!(
            addr.resolve(&id, ArtifactKind::Page),
            Path::new("/client/pages/a/one.txt")
        );
        assert_eq!(
            addr.resolve(&id, ArtifactKind::Meta),
            Path::new("/client/meta/a/one.meta")
        );
        assert_eq!(
            addr.resolve(&id, ArtifactKind::Changelog),
            Path::new("/client/meta/a/one.changes")
        );
        assert_eq!(
            addr.resolve(&id, ArtifactKind::Header),
            Path::new("/client/header/a/one.txt")
        );
    }

    #[test]
    fn test_resolve_media_artifacts() {
        let addr = TreeAddress::new("/client");
        let id = Id::new("gallery:pic.png");

        assert_eq!(
            addr.resolve(&id, ArtifactKind::Media),
            Path::new("/client/media/gallery/pic.png")
        );
        assert_eq!(
            addr.resolve(&id, ArtifactKind::MediaChangelog),
            Path::new("/client/media_meta/gallery/pic.png.changes")
        );
    }

    #[test]
    fn test_namespace_dir() {
        let addr = TreeAddress::new("/client");
        assert_eq!(
            addr.namespace_dir(&Id::new("log:transfers")),
            Path::new("/client/pages/log/transfers")
        );
    }
}
