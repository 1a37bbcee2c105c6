//! Usage aggregation
//!
//! Computes the recursive size of the storage root and combines it with
//! the host disk capacity reported by the platform probe chain.

use log::warn;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::storage::resolver::PathResolver;
use crate::usage::probe::{self, DiskProbe};

/// Storage statistics for the root. The capacity fields serialize to
/// null when every probe fails; `used` is always computed.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub used: u64,
    pub total: Option<u64>,
    pub free: Option<u64>,
    pub available: Option<u64>,
}

/// Recursive file-size sum under `dir`.
///
/// Unreadable directories and entries contribute 0 instead of aborting
/// the aggregate; one bad branch must never fail the whole walk.
pub fn directory_size(dir: &Path) -> u64 {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut total = 0u64;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping entry under {}: {}", dir.display(), e);
                continue;
            }
        };

        match entry.metadata() {
            Ok(metadata) if metadata.is_dir() => total += directory_size(&entry.path()),
            Ok(metadata) => total += metadata.len(),
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    total
}

/// Compute a usage snapshot for the resolver's root.
///
/// The size walk runs on the blocking pool; the probe chain runs under
/// its own timeouts. Neither is cached: every call reflects the
/// filesystem at call time.
pub async fn report(resolver: &PathResolver, probes: &[Box<dyn DiskProbe>]) -> UsageSnapshot {
    let root = resolver.root().to_path_buf();
    let used = match tokio::task::spawn_blocking(move || directory_size(&root)).await {
        Ok(used) => used,
        Err(e) => {
            warn!("Usage walk did not complete: {}", e);
            0
        }
    };

    match probe::query(probes, resolver.root()).await {
        Some(space) => UsageSnapshot {
            used,
            total: Some(space.total),
            free: Some(space.free),
            available: Some(space.available),
        },
        None => UsageSnapshot {
            used,
            total: None,
            free: None,
            available: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_size_sums_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), vec![0u8; 100]).unwrap();
        fs::create_dir_all(dir.path().join("x").join("y")).unwrap();
        fs::write(dir.path().join("x").join("b.bin"), vec![0u8; 50]).unwrap();
        fs::write(dir.path().join("x").join("y").join("c.bin"), vec![0u8; 7]).unwrap();
        // Empty folders contribute 0.
        fs::create_dir(dir.path().join("empty")).unwrap();

        assert_eq!(directory_size(dir.path()), 157);
    }

    #[test]
    fn test_directory_size_of_empty_root_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(directory_size(dir.path()), 0);
    }

    #[test]
    fn test_missing_directory_contributes_zero() {
        assert_eq!(directory_size(Path::new("/nonexistent/path/abc123")), 0);
    }

    #[tokio::test]
    async fn test_report_degrades_to_null_capacity() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), vec![0u8; 42]).unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();

        let snapshot = report(&resolver, &[]).await;
        assert_eq!(snapshot.used, 42);
        assert_eq!(snapshot.total, None);
        assert_eq!(snapshot.free, None);
        assert_eq!(snapshot.available, None);
    }
}
