//! Host file access for workspace documents and artifacts
//!
//! Everything gam reads or writes goes through the [`Host`] trait, with
//! paths given relative to the host root. [`DiskHost`] maps those paths onto
//! a real directory; [`MemoryFS`] keeps them in memory for tests and dry
//! runs.

use crate::error::{Error, Result};
use crate::path::normalize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File access rooted at a workspace directory.
pub trait Host {
    /// Absolute (or caller-relative) directory all host paths resolve against.
    fn root(&self) -> &Path;

    fn exists(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Write a file, creating parent directories as needed.
    fn write(&mut self, path: &str, content: &[u8]) -> Result<()>;

    fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| Error::Filesystem {
            message: format!("{} is not valid UTF-8: {}", path, e),
        })
    }
}

/// Host backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskHost {
    root: PathBuf,
}

impl DiskHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(normalize(path))
    }
}

impl Host for DiskHost {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| Error::Filesystem {
            message: format!("Failed to read {}: {}", full.display(), e),
        })
    }

    fn write(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, content).map_err(|e| Error::Filesystem {
            message: format!("Failed to write {}: {}", full.display(), e),
        })
    }
}

/// Represents a file held in memory
#[derive(Debug, Clone)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// In-memory host
#[derive(Debug, Clone)]
pub struct MemoryFS {
    root: PathBuf,
    /// Files stored as normalized path -> content mapping
    files: HashMap<PathBuf, File>,
}

impl Default for MemoryFS {
    fn default() -> Self {
        Self::with_root("/workspace")
    }
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty filesystem reporting `root` as its root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashMap::new(),
        }
    }

    /// Add a file with string content
    pub fn add_file_string(&mut self, path: &str, content: &str) -> Result<()> {
        self.files
            .insert(PathBuf::from(normalize(path)), File::from_string(content));
        Ok(())
    }

    /// Add a file with content
    pub fn add_file_content(&mut self, path: &str, content: Vec<u8>) -> Result<()> {
        self.files
            .insert(PathBuf::from(normalize(path)), File::new(content));
        Ok(())
    }

    /// Get a file by path
    pub fn get_file(&self, path: &str) -> Option<&File> {
        self.files.get(Path::new(&normalize(path)))
    }

    /// Remove a file
    pub fn remove_file(&mut self, path: &str) -> Option<File> {
        self.files.remove(Path::new(&normalize(path)))
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Host for MemoryFS {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(Path::new(&normalize(path)))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.get_file(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| Error::Filesystem {
                message: format!("File not found: {}", path),
            })
    }

    fn write(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.add_file_content(path, content.to_vec())
    }
}
