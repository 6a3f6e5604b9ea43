//! Filesystem access for the synchroniser, behind a small trait so the walk can
//! run against an in-memory tree in tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// Broken symlinks, sockets, fifos and the like. Never uploaded.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

pub trait DirectoryTree {
    /// Turn a user-supplied path into the absolute root of a walk.
    /// Must fail with `io::ErrorKind::NotFound` when nothing exists there.
    fn resolve(&self, path: &Path) -> io::Result<PathBuf>;

    /// Immediate children of `dir`, in no particular order.
    fn entries(&self, dir: &Path) -> io::Result<Vec<TreeEntry>>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTree;

impl DirectoryTree for LocalTree {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(expand_home(path))
    }

    fn entries(&self, dir: &Path) -> io::Result<Vec<TreeEntry>> {
        let mut entries = Vec::new();
        for entry_res in fs::read_dir(dir)? {
            let path = entry_res?.path();
            // Follows symlinks; cycles are cut by the walker's visited set.
            let kind = match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                Ok(meta) if meta.is_file() => EntryKind::File,
                Ok(_) => EntryKind::Other,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Cannot stat entry");
                    EntryKind::Other
                }
            };
            entries.push(TreeEntry { path, kind });
        }
        Ok(entries)
    }
}

/// Expand a leading `~` to the current user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
