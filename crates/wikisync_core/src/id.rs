//! Content identifiers.
//!
//! An [`Id`] is the logical name of a page or media file, independent of any
//! physical path: hierarchical segments joined by `:`, e.g. `wiki:syntax`.
//! Identifiers are normalized on construction (lowercased, illegal characters
//! replaced, separators collapsed) so that two ids are equal iff their
//! normalized forms match.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Whether an identifier names a wiki page or a media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A text page
    Page,
    /// A binary media file (image, attachment, ...)
    Media,
}

/// A normalized hierarchical content identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(String);

impl Id {
    /// Separator between hierarchy segments
    pub const SEPARATOR: char = ':';

    /// Create an identifier from raw user or host input, normalizing it.
    ///
    /// Normalization mirrors the host wiki's id cleaning: lowercase, path
    /// separators become `:`, whitespace becomes `_`, anything outside
    /// `[a-z0-9._\-:]` is dropped, and repeated or dangling separators are
    /// collapsed.
    pub fn new(raw: &str) -> Self {
        let mut cleaned = String::with_capacity(raw.len());
        for ch in raw.to_lowercase().chars() {
            match ch {
                '/' | ';' | ':' => cleaned.push(Self::SEPARATOR),
                c if c.is_whitespace() => cleaned.push('_'),
                c if c.is_ascii_alphanumeric() => cleaned.push(c),
                '.' | '_' | '-' => cleaned.push(ch),
                _ => {}
            }
        }

        let segments: Vec<&str> = cleaned
            .split(Self::SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect();
        Id(segments.join(&Self::SEPARATOR.to_string()))
    }

    /// Derive an identifier from a path relative to a tree root.
    ///
    /// Directory separators become hierarchy separators; the caller is
    /// expected to have stripped any artifact extension already.
    pub fn from_relative_path(rel: &Path) -> Self {
        let joined = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join(":");
        Self::new(&joined)
    }

    /// The identifier as a relative filesystem path fragment
    /// (`wiki:syntax` becomes `wiki/syntax`).
    pub fn to_path_fragment(&self) -> PathBuf {
        self.0.split(Self::SEPARATOR).collect()
    }

    /// The hierarchy segments of this identifier
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// The namespace part of this identifier (everything before the last
    /// segment), or `""` for a top-level id.
    pub fn namespace(&self) -> &str {
        match self.0.rfind(Self::SEPARATOR) {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// String form of the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this identifier lives inside the given namespace
    /// (or is the namespace itself).
    pub fn in_namespace(&self, namespace: &Id) -> bool {
        self == namespace
            || self
                .0
                .starts_with(&format!("{}{}", namespace.0, Self::SEPARATOR))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Id::new(&raw))
    }
}
