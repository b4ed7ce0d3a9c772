//! Abstraction over filesystem operations.
//!
//! Both content trees are plain directories, so everything in this crate is
//! generic over this trait. [`RealFileSystem`] maps to `std::fs`;
//! [`InMemoryFileSystem`] keeps whole trees in memory for tests.
//!
//! Unlike a generic filesystem shim, this trait carries modification times:
//! the transfer engine stamps the primary's mtime onto client copies so the
//! two trees stay comparable across runs.

use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Abstraction over filesystem operations
pub trait FileSystem {
    /// Reads a text file
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Reads a binary file
    fn read_binary(&self, path: &Path) -> Result<Vec<u8>>;

    /// Overwrites (or creates) a text file
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Overwrites (or creates) a binary file
    fn write_binary(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Appends to a text file, creating it if absent
    fn append_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Creates a file ONLY if it doesn't exist.
    /// Returns an error if the file exists.
    fn create_new(&self, path: &Path, content: &str) -> Result<()>;

    /// Deletes a file
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Checks if a path exists (file or directory)
    fn exists(&self, path: &Path) -> bool;

    /// Checks if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Lists the direct children of a directory, sorted by name
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Modification time of a file
    fn modified(&self, path: &Path) -> Result<SystemTime>;

    /// Overrides the modification time of an existing file
    fn set_modified(&self, path: &Path, mtime: SystemTime) -> Result<()>;
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (*self).read_to_string(path)
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        (*self).read_binary(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file(path, content)
    }

    fn write_binary(&self, path: &Path, content: &[u8]) -> Result<()> {
        (*self).write_binary(path, content)
    }

    fn append_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).append_file(path, content)
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        (*self).create_new(path, content)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        (*self).delete_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (*self).is_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (*self).create_dir_all(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (*self).list_dir(dir)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        (*self).modified(path)
    }

    fn set_modified(&self, path: &Path, mtime: SystemTime) -> Result<()> {
        (*self).set_modified(path, mtime)
    }
}

// ============================================================================
// RealFileSystem
// ============================================================================

use std::fs::{self, OpenOptions};
use std::io::Write;

/// A simple filesystem implementation that maps to std::fs methods
#[derive(Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content)
    }

    fn write_binary(&self, path: &Path, content: &[u8]) -> Result<()> {
        fs::write(path, content)
    }

    fn append_file(&self, path: &Path, content: &str) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(content.as_bytes())
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        // This atomic check prevents race conditions
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(content.as_bytes())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn set_modified(&self, path: &Path, mtime: SystemTime) -> Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_modified(mtime)
    }
}

// ============================================================================
// InMemoryFileSystem
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

#[derive(Clone)]
struct FileData {
    bytes: Vec<u8>,
    mtime: SystemTime,
}

/// An in-memory filesystem implementation.
/// Useful for testing whole transfer runs without touching disk.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    /// Files stored as path -> (bytes, mtime)
    files: Arc<RwLock<HashMap<PathBuf, FileData>>>,
    /// Directories that exist (implicitly created when files are added)
    directories: Arc<RwLock<HashSet<PathBuf>>>,
}

impl InMemoryFileSystem {
    /// Create a new empty in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a list of all file paths in the filesystem
    pub fn list_all_files(&self) -> Vec<PathBuf> {
        let files = self.files.read().unwrap();
        files.keys().cloned().collect()
    }

    /// Helper to normalize paths (remove . and .. components where possible)
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            use std::path::Component;
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !components.is_empty() {
                        components.pop();
                    }
                }
                c => components.push(c),
            }
        }
        components.iter().collect()
    }

    fn register_parents(dirs: &mut HashSet<PathBuf>, path: &Path) {
        let mut current = path;
        while let Some(parent) = current.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.insert(parent.to_path_buf());
            }
            current = parent;
        }
    }

    fn insert(&self, path: &Path, bytes: Vec<u8>) {
        let normalized = Self::normalize_path(path);
        let mut dirs = self.directories.write().unwrap();
        Self::register_parents(&mut dirs, &normalized);
        drop(dirs);

        let mut files = self.files.write().unwrap();
        files.insert(
            normalized,
            FileData {
                bytes,
                mtime: SystemTime::now(),
            },
        );
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read_binary(path)?;
        String::from_utf8(bytes)
            .map_err(|_| Error::new(ErrorKind::InvalidData, "file is not valid UTF-8"))
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().unwrap();
        files
            .get(&normalized)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("File not found: {:?}", path)))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.insert(path, content.as_bytes().to_vec());
        Ok(())
    }

    fn write_binary(&self, path: &Path, content: &[u8]) -> Result<()> {
        self.insert(path, content.to_vec());
        Ok(())
    }

    fn append_file(&self, path: &Path, content: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let existing = {
            let files = self.files.read().unwrap();
            files.get(&normalized).map(|f| f.bytes.clone())
        };
        let mut bytes = existing.unwrap_or_default();
        bytes.extend_from_slice(content.as_bytes());
        self.insert(path, bytes);
        Ok(())
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);
        {
            let files = self.files.read().unwrap();
            if files.contains_key(&normalized) {
                return Err(Error::new(
                    ErrorKind::AlreadyExists,
                    format!("File already exists: {:?}", path),
                ));
            }
        }
        self.insert(path, content.as_bytes().to_vec());
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut files = self.files.write().unwrap();
        if files.remove(&normalized).is_some() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::NotFound,
                format!("File not found: {:?}", path),
            ))
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().unwrap();
        let dirs = self.directories.read().unwrap();
        files.contains_key(&normalized) || dirs.contains(&normalized)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        let dirs = self.directories.read().unwrap();
        dirs.contains(&normalized)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut dirs = self.directories.write().unwrap();
        dirs.insert(normalized.clone());
        Self::register_parents(&mut dirs, &normalized);
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let normalized = Self::normalize_path(dir);
        if !self.is_dir(&normalized) {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("Directory not found: {:?}", dir),
            ));
        }

        let files = self.files.read().unwrap();
        let dirs = self.directories.read().unwrap();

        let mut result: Vec<PathBuf> = files
            .keys()
            .chain(dirs.iter())
            .filter(|p| p.parent() == Some(normalized.as_path()))
            .cloned()
            .collect();
        result.sort();
        result.dedup();
        Ok(result)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().unwrap();
        files
            .get(&normalized)
            .map(|f| f.mtime)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("File not found: {:?}", path)))
    }

    fn set_modified(&self, path: &Path, mtime: SystemTime) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut files = self.files.write().unwrap();
        match files.get_mut(&normalized) {
            Some(f) => {
                f.mtime = mtime;
                Ok(())
            }
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("File not found: {:?}", path),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_in_memory_fs_basic_operations() {
        let fs = InMemoryFileSystem::new();

        fs.write_file(Path::new("test.txt"), "Hello, World!").unwrap();
        assert_eq!(
            fs.read_to_string(Path::new("test.txt")).unwrap(),
            "Hello, World!"
        );

        assert!(fs.exists(Path::new("test.txt")));
        assert!(!fs.exists(Path::new("nonexistent.txt")));

        fs.delete_file(Path::new("test.txt")).unwrap();
        assert!(!fs.exists(Path::new("test.txt")));
    }

    #[test]
    fn test_in_memory_fs_create_new() {
        let fs = InMemoryFileSystem::new();

        fs.create_new(Path::new("new.txt"), "Content").unwrap();
        assert_eq!(fs.read_to_string(Path::new("new.txt")).unwrap(), "Content");

        let result = fs.create_new(Path::new("new.txt"), "Other content");
        assert!(result.is_err());
    }

    #[test]
    fn test_in_memory_fs_append() {
        let fs = InMemoryFileSystem::new();

        fs.append_file(Path::new("log.txt"), "one\n").unwrap();
        fs.append_file(Path::new("log.txt"), "two\n").unwrap();
        assert_eq!(
            fs.read_to_string(Path::new("log.txt")).unwrap(),
            "one\ntwo\n"
        );
    }

    #[test]
    fn test_in_memory_fs_directories() {
        let fs = InMemoryFileSystem::new();

        fs.write_file(Path::new("a/b/c/file.txt"), "Content").unwrap();

        assert!(fs.is_dir(Path::new("a")));
        assert!(fs.is_dir(Path::new("a/b")));
        assert!(fs.is_dir(Path::new("a/b/c")));
        assert!(fs.exists(Path::new("a/b/c/file.txt")));
    }

    #[test]
    fn test_in_memory_fs_list_dir_sorted() {
        let fs = InMemoryFileSystem::new();

        fs.write_file(Path::new("dir/b.txt"), "b").unwrap();
        fs.write_file(Path::new("dir/a.txt"), "a").unwrap();
        fs.write_file(Path::new("dir/sub/c.txt"), "c").unwrap();

        let entries = fs.list_dir(Path::new("dir")).unwrap();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("dir/a.txt"),
                PathBuf::from("dir/b.txt"),
                PathBuf::from("dir/sub"),
            ]
        );
    }

    #[test]
    fn test_in_memory_fs_mtime_override() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("page.txt"), "body").unwrap();

        let stamp = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        fs.set_modified(Path::new("page.txt"), stamp).unwrap();
        assert_eq!(fs.modified(Path::new("page.txt")).unwrap(), stamp);
    }

    #[test]
    fn test_in_memory_fs_path_normalization() {
        let fs = InMemoryFileSystem::new();

        fs.write_file(Path::new("dir/file.txt"), "Content").unwrap();

        assert!(fs.exists(Path::new("dir/./file.txt")));
        assert!(fs.exists(Path::new("dir/sub/../file.txt")));
    }
}
