//! File operations
//!
//! Upload, folder creation, deletion, and relocation for the storage
//! root. Every operation independently resolves all of its path
//! arguments through the resolver before touching the filesystem.

use log::{error, info};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::StorageError;
use crate::storage::resolver::{self, PathResolver};

/// Payload returned for a download request.
#[derive(Debug, Clone)]
pub struct Download {
    pub name: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

/// Write uploaded bytes to `folder/filename`, overwriting any existing
/// file.
///
/// The destination directory is created recursively first. A directory
/// that appears and then a write that fails is reported as `WriteFailed`
/// rather than rolled back or swallowed.
pub fn upload(
    resolver: &PathResolver,
    folder: &str,
    filename: &str,
    bytes: &[u8],
) -> Result<(), StorageError> {
    resolver::validate_component(filename)?;

    let client_path = join_client(folder, filename);
    let dir = resolver.resolve(folder)?;
    let target = resolver.resolve(&client_path)?;

    fs::create_dir_all(&dir)?;

    if let Err(e) = fs::write(&target, bytes) {
        error!("Failed to write \"{}\": {}", client_path, e);
        return Err(StorageError::WriteFailed {
            path: client_path,
            source: e,
        });
    }

    info!("Stored {} bytes at \"{}\"", bytes.len(), client_path);
    Ok(())
}

/// Create `parent/name` and any missing ancestors. Idempotent: an
/// already-existing folder is a success.
pub fn create_folder(
    resolver: &PathResolver,
    parent: &str,
    name: &str,
) -> Result<(), StorageError> {
    resolver::validate_component(name)?;

    let client_path = join_client(parent, name);
    let target = resolver.resolve(&client_path)?;

    fs::create_dir_all(&target).map_err(|e| {
        // create_dir_all reports AlreadyExists only when a non-directory
        // is in the way; an existing folder is fine.
        if e.kind() == io::ErrorKind::AlreadyExists {
            StorageError::AlreadyExists(client_path.clone())
        } else {
            StorageError::from(e)
        }
    })?;

    info!("Created folder \"{}\"", client_path);
    Ok(())
}

/// Delete a file or recursively delete a folder.
pub fn delete(resolver: &PathResolver, path: &str) -> Result<(), StorageError> {
    let target = resolver.resolve(path)?;

    if target == resolver.root() {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    // symlink_metadata so a symlinked directory is unlinked, not recursed.
    let metadata = fs::symlink_metadata(&target).map_err(|e| missing(path, e))?;

    if metadata.is_dir() {
        fs::remove_dir_all(&target)?;
    } else {
        fs::remove_file(&target)?;
    }

    info!("Deleted \"{}\"", path);
    Ok(())
}

/// Move an entry to a new location under the root.
pub fn move_entry(
    resolver: &PathResolver,
    source: &str,
    destination: &str,
) -> Result<(), StorageError> {
    relocate(resolver, source, destination)
}

/// Rename an entry in place: the destination is the source's sibling
/// with the new leaf name.
pub fn rename(resolver: &PathResolver, source: &str, new_name: &str) -> Result<(), StorageError> {
    resolver::validate_component(new_name)?;

    let destination = match source.trim_end_matches('/').rsplit_once('/') {
        Some((parent, _)) => join_client(parent, new_name),
        None => new_name.to_string(),
    };

    relocate(resolver, source, &destination)
}

/// Read a whole file for download.
pub fn read_for_download(resolver: &PathResolver, path: &str) -> Result<Download, StorageError> {
    let target = resolver.resolve(path)?;

    let metadata = fs::metadata(&target).map_err(|e| missing(path, e))?;
    if metadata.is_dir() {
        return Err(StorageError::InvalidTarget(path.to_string()));
    }

    let bytes = fs::read(&target)?;

    Ok(Download {
        name: leaf_name(&target),
        size: metadata.len(),
        bytes,
    })
}

/// Shared primitive behind move and rename.
///
/// The existence checks and the rename are not atomic: two concurrent
/// relocations to the same destination can both pass the check. Accepted
/// limitation of the no-coordination request model.
fn relocate(resolver: &PathResolver, source: &str, destination: &str) -> Result<(), StorageError> {
    let from = resolver.resolve(source)?;
    let to = resolver.resolve(destination)?;

    if from == resolver.root() {
        return Err(StorageError::InvalidPath(source.to_string()));
    }
    if !from.exists() {
        return Err(StorageError::NotFound(source.to_string()));
    }
    if to.exists() {
        return Err(StorageError::AlreadyExists(destination.to_string()));
    }

    // The root itself is assumed to pre-exist; anything deeper may need
    // creating before the relocation.
    if let Some(parent) = to.parent() {
        if parent != resolver.root() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::rename(&from, &to)?;

    info!("Relocated \"{}\" -> \"{}\"", source, destination);
    Ok(())
}

/// Join a client folder path and a leaf name. The resolver tolerates
/// redundant slashes, so an empty folder needs no special casing beyond
/// not producing a bare "/".
fn join_client(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Map a stat failure to NotFound, preserving other IO errors.
fn missing(path: &str, error: io::Error) -> StorageError {
    if error.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::IoError(error)
    }
}

fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
