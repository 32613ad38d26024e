//! Filesystem seam for magicboot
//!
//! The startup runner and exception resolver only ever need four operations:
//! list child folders, list files by extension, read a file, and probe for
//! existence. [`FileService`] captures exactly that surface so the
//! traversal logic stays testable against mocks, and [`LocalFiles`] is the
//! `std::fs` implementation used in production.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Narrow filesystem interface consumed by the bootstrap protocols.
#[cfg_attr(test, mockall::automock)]
pub trait FileService: Send + Sync {
    /// Immediate child folders of `path`, sorted lexicographically.
    /// A missing folder yields an empty list.
    fn list_folders(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Immediate child files of `path` carrying `extension` (with leading
    /// dot), sorted lexicographically. A missing folder yields an empty
    /// list.
    fn list_files(&self, path: &Path, extension: &str) -> Result<Vec<PathBuf>>;

    /// Full text contents of the file at `path`.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// `FileService` backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl LocalFiles {
    /// Create a new local filesystem service.
    pub fn new() -> Self {
        Self
    }
}

impl FileService for LocalFiles {
    fn list_folders(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.is_dir() {
            return Ok(Vec::new());
        }

        let mut folders = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_dir() {
                folders.push(entry_path);
            }
        }
        folders.sort();
        Ok(folders)
    }

    fn list_files(&self, path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        if !path.is_dir() {
            return Ok(Vec::new());
        }

        let wanted = extension.trim_start_matches('.');
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file()
                && entry_path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
            {
                files.push(entry_path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("beta")).unwrap();
        fs::create_dir(tmp.path().join("alpha")).unwrap();
        fs::write(tmp.path().join("b.hl"), "log:b").unwrap();
        fs::write(tmp.path().join("a.hl"), "log:a").unwrap();
        fs::write(tmp.path().join("readme.md"), "# hi").unwrap();
        tmp
    }

    #[test]
    fn test_list_folders_sorted() {
        let tmp = layout();
        let folders = LocalFiles::new().list_folders(tmp.path()).unwrap();
        let names: Vec<_> = folders
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_list_folders_missing_path_is_empty() {
        let folders = LocalFiles::new()
            .list_folders(Path::new("/nonexistent/magicboot"))
            .unwrap();
        assert!(folders.is_empty());
    }

    #[test]
    fn test_list_files_filters_extension_and_sorts() {
        let tmp = layout();
        let files = LocalFiles::new().list_files(tmp.path(), ".hl").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.hl", "b.hl"]);
    }

    #[test]
    fn test_list_files_accepts_extension_without_dot() {
        let tmp = layout();
        let files = LocalFiles::new().list_files(tmp.path(), "hl").unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_read_to_string() {
        let tmp = layout();
        let text = LocalFiles::new()
            .read_to_string(&tmp.path().join("a.hl"))
            .unwrap();
        assert_eq!(text, "log:a");
    }

    #[test]
    fn test_exists_only_for_files() {
        let tmp = layout();
        let fsvc = LocalFiles::new();
        assert!(fsvc.exists(&tmp.path().join("a.hl")));
        assert!(!fsvc.exists(&tmp.path().join("missing.hl")));
        // Folders are not files.
        assert!(!fsvc.exists(&tmp.path().join("alpha")));
    }
}
