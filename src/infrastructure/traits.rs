//! Filesystem boundary used to read documents and write exports.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Create the directories above `path`.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// The local disk.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }
}

/// Files held in memory, keyed by path. Directories always exist.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), content.into());
        }
        self
    }

    fn poisoned() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "file table lock poisoned")
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let files = self.files.lock().map_err(|_| Self::poisoned())?;
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display()))
        })
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut files = self.files.lock().map_err(|_| Self::poisoned())?;
        files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn ensure_parent(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_memory_file_when_read_then_returns_content() {
        let fs = MemoryFileSystem::new().with_file("/data/tree.gramps", "<database/>");

        assert!(fs.exists(Path::new("/data/tree.gramps")));
        assert_eq!(
            fs.read_to_string(Path::new("/data/tree.gramps")).unwrap(),
            "<database/>"
        );
    }

    #[test]
    fn given_missing_memory_file_when_read_then_not_found() {
        let fs = MemoryFileSystem::new();

        let err = fs.read_to_string(Path::new("/nope")).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn given_write_when_read_back_then_round_trips() {
        let fs = MemoryFileSystem::new();
        fs.write(Path::new("out/tree.json"), "{}").unwrap();
        assert_eq!(fs.read_to_string(Path::new("out/tree.json")).unwrap(), "{}");
    }
}
