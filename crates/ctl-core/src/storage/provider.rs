use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::kernel::error::Result;

/// Read access to the files that back configuration sources.
pub trait StorageProvider: Send + Sync + Debug {
    /// Short label used in log messages.
    fn name(&self) -> &str;

    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Read a whole configuration source.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Entries of a directory, sorted by path.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}
