use std::path::{Path, PathBuf};

use anyhow::Result;

pub trait FileSystem: Send + Sync {
    /// Read a whole file
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write a file, creating missing parent directories
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;

    fn is_dir(&self, path: &Path) -> bool;

    /// All regular files below `dir`, recursively, sorted by path.
    /// Hidden files and directories are skipped.
    fn walk_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}
