//! Directory listing
//!
//! Builds entry listings with per-child metadata for client display.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::io;

use crate::error::StorageError;
use crate::storage::resolver::PathResolver;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// One file or folder as reported by a directory listing.
///
/// Field names are serialized as camelCase for the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    /// RFC 3339 timestamp; empty when the platform cannot report one.
    pub modified: String,
    /// Root-relative path with forward slashes.
    pub path: String,
}

/// A directory listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub items: Vec<Entry>,
    pub current_path: String,
}

/// List the contents of a folder under the root.
///
/// A folder's reported size is 0; only the usage reporter recurses.
/// Children whose metadata cannot be read are skipped rather than
/// failing the whole listing. No ordering is guaranteed.
pub fn list_directory(resolver: &PathResolver, folder: &str) -> Result<Listing, StorageError> {
    let real_path = resolver.resolve(folder)?;

    if !real_path.is_dir() {
        return Err(StorageError::NotFound(folder.to_string()));
    }

    let entries = fs::read_dir(&real_path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(folder.to_string())
        } else {
            StorageError::from(e)
        }
    })?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in \"{}\": {}", folder, e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping \"{}\": {}", name, e);
                continue;
            }
        };

        let kind = if metadata.is_dir() {
            EntryKind::Folder
        } else {
            EntryKind::File
        };

        let modified = metadata
            .modified()
            .map(|time| DateTime::<Utc>::from(time).to_rfc3339())
            .unwrap_or_default();

        items.push(Entry {
            path: resolver.relative(&entry.path()),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            kind,
            modified,
            name,
        });
    }

    info!("Listed {} entries in \"{}\"", items.len(), folder);

    Ok(Listing {
        items,
        current_path: folder.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> (tempfile::TempDir, PathResolver) {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        (dir, resolver)
    }

    #[test]
    fn test_empty_root_lists_nothing() {
        let (_dir, resolver) = resolver();
        let listing = list_directory(&resolver, "").unwrap();
        assert!(listing.items.is_empty());
        assert_eq!(listing.current_path, "");
    }

    #[test]
    fn test_file_metadata_is_reported() {
        let (dir, resolver) = resolver();
        fs::write(dir.path().join("notes.md"), "hello, world").unwrap();

        let listing = list_directory(&resolver, "").unwrap();
        assert_eq!(listing.items.len(), 1);

        let entry = &listing.items[0];
        assert_eq!(entry.name, "notes.md");
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size, 12);
        assert_eq!(entry.path, "notes.md");
        assert!(!entry.modified.is_empty());
    }

    #[test]
    fn test_folder_size_is_zero() {
        let (dir, resolver) = resolver();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("big.bin"), vec![0u8; 4096]).unwrap();

        let listing = list_directory(&resolver, "").unwrap();
        let entry = listing.items.iter().find(|e| e.name == "docs").unwrap();
        assert_eq!(entry.kind, EntryKind::Folder);
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn test_nested_paths_use_forward_slashes() {
        let (dir, resolver) = resolver();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("a.txt"), "x").unwrap();

        let listing = list_directory(&resolver, "docs").unwrap();
        assert_eq!(listing.items[0].path, "docs/a.txt");
        assert_eq!(listing.current_path, "docs");
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let (_dir, resolver) = resolver();
        assert!(matches!(
            list_directory(&resolver, "nope"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_listing_a_file_is_not_found() {
        let (dir, resolver) = resolver();
        fs::write(dir.path().join("plain.txt"), "x").unwrap();
        assert!(matches!(
            list_directory(&resolver, "plain.txt"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_traversal_is_rejected_before_io() {
        let (_dir, resolver) = resolver();
        assert!(matches!(
            list_directory(&resolver, "../.."),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
