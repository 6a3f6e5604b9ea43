//! One-way synchronisation of a local directory tree into a bucket.
//!
//! The walk is depth-first over an explicit stack of pending directories.
//! Every regular file becomes one upload, keyed by its path relative to the
//! resolved root with `/` separators, and typed from its file name.
//! A directory reached twice (through a symlink) is only walked the first time.
//!
//! # Error Handling
//! Fail-fast: the first failed upload aborts the run and is returned as
//! [`SyncError::Upload`]. Objects uploaded before it stay in the bucket.
//! A root that does not exist is reported before anything is uploaded.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::contract::{StorageClient, StorageError};
use crate::tree::{DirectoryTree, EntryKind};

/// Content type used when the file name maps to no known type.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug)]
pub struct SyncReport {
    pub bucket: String,
    pub root: PathBuf,
    /// Uploads in the order they happened.
    pub objects: Vec<UploadedObject>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    pub content_type: String,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("path not found: {}", path.display())]
    PathNotFound { path: PathBuf },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not under sync root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("{} is not valid UTF-8 and cannot be used as an object key", path.display())]
    NonUtf8Path { path: PathBuf },
    #[error("failed to upload `{key}`")]
    Upload {
        key: String,
        #[source]
        source: StorageError,
    },
}

/// Guess the content type from a file name or key.
pub fn content_type_for(name: &str) -> &'static str {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Object key for `path`: its location relative to `root`, joined with `/`.
pub fn object_key(root: &Path, path: &Path) -> Result<String, SyncError> {
    let rel_path = path.strip_prefix(root).map_err(|_| SyncError::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;
    let mut segments: Vec<&str> = Vec::new();
    for comp in rel_path.components() {
        let segment = comp
            .as_os_str()
            .to_str()
            .ok_or_else(|| SyncError::NonUtf8Path {
                path: path.to_path_buf(),
            })?;
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

/// Resolve `local_path` and upload every regular file under it to `bucket`.
pub async fn sync<C, T>(
    client: &C,
    tree: &T,
    local_path: &Path,
    bucket: &str,
) -> Result<SyncReport, SyncError>
where
    C: StorageClient + ?Sized,
    T: DirectoryTree + ?Sized,
{
    let root = tree.resolve(local_path).map_err(|e| {
        error!(path = %local_path.display(), error = %e, "[SYNC][ERROR] Cannot resolve sync root");
        if e.kind() == io::ErrorKind::NotFound {
            SyncError::PathNotFound {
                path: local_path.to_path_buf(),
            }
        } else {
            SyncError::Io {
                path: local_path.to_path_buf(),
                source: e,
            }
        }
    })?;
    info!(root = %root.display(), bucket = %bucket, "[SYNC] Starting synchronisation");

    let mut objects = Vec::new();
    let mut pending = vec![root.clone()];
    let mut visited: HashSet<PathBuf> = HashSet::new();

    while let Some(dir) = pending.pop() {
        let canonical = tree.resolve(&dir).map_err(|e| {
            error!(dir = %dir.display(), error = %e, "[SYNC][ERROR] Failed to resolve directory");
            SyncError::Io {
                path: dir.clone(),
                source: e,
            }
        })?;
        if !visited.insert(canonical) {
            debug!(dir = %dir.display(), "[SYNC] Directory already walked, skipping");
            continue;
        }
        let entries = tree.entries(&dir).map_err(|e| {
            error!(dir = %dir.display(), error = %e, "[SYNC][ERROR] Failed to list directory");
            SyncError::Io {
                path: dir.clone(),
                source: e,
            }
        })?;
        for entry in entries {
            match entry.kind {
                EntryKind::Directory => pending.push(entry.path),
                EntryKind::File => {
                    let uploaded = upload_entry(client, &root, &entry.path, bucket).await?;
                    objects.push(uploaded);
                }
                EntryKind::Other => {
                    debug!(path = %entry.path.display(), "[SYNC] Skipping entry that is neither file nor directory");
                }
            }
        }
    }

    info!(count = objects.len(), bucket = %bucket, "[SYNC] Synchronisation complete");
    Ok(SyncReport {
        bucket: bucket.to_string(),
        root,
        objects,
    })
}

async fn upload_entry<C>(
    client: &C,
    root: &Path,
    path: &Path,
    bucket: &str,
) -> Result<UploadedObject, SyncError>
where
    C: StorageClient + ?Sized,
{
    let key = object_key(root, path)?;
    let content_type = content_type_for(&key);
    debug!(key = %key, content_type, "[SYNC][UPLOAD] Uploading file");

    match client.upload_file(bucket, path, &key, content_type).await {
        Ok(()) => {
            info!(key = %key, "[SYNC][UPLOAD] Uploaded");
            Ok(UploadedObject {
                key,
                content_type: content_type.to_string(),
            })
        }
        Err(e) => {
            error!(key = %key, error = %e, "[SYNC][ERROR][UPLOAD] upload_file failed");
            Err(SyncError::Upload { key, source: e })
        }
    }
}
