use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::provider::StorageProvider;

/// Reads configuration sources from the local disk.
///
/// Relative paths are resolved against `base_path`; absolute paths are used
/// as given.
#[derive(Clone)]
pub struct LocalStorageProvider {
    base_path: PathBuf,
}

impl LocalStorageProvider {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.base_path.join(path)
    }
}

impl StorageProvider for LocalStorageProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve_path(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve_path(path).is_dir()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let full_path = self.resolve_path(path);
        fs::read_to_string(&full_path)
            .map_err(|e| StorageSystemError::io(e, "read_to_string", full_path).into())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let full_path = self.resolve_path(path);
        let entries = fs::read_dir(&full_path)
            .map_err(|e| StorageSystemError::io(e, "read_dir", full_path.clone()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageSystemError::io(e, "read_dir_entry", full_path.clone()))?;
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }
}

impl fmt::Debug for LocalStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorageProvider")
            .field("base_path", &self.base_path)
            .finish()
    }
}
