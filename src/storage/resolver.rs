//! Path resolution
//!
//! Confines client-supplied paths to the storage root. This is the sole
//! security boundary against directory traversal: every path derived
//! from client input must pass through [`PathResolver::resolve`] before
//! any filesystem call.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Resolves client paths against a fixed storage root.
///
/// Constructed once at startup and injected into every operation, so
/// tests can point it at a temporary directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver over an existing root directory.
    ///
    /// The root is canonicalized once so later prefix checks compare
    /// against a stable absolute form.
    pub fn new(root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    /// The canonical storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client path to an absolute path inside the root.
    ///
    /// Normalization is purely lexical: `.` segments are dropped and
    /// `..` pops one level, so targets that do not exist yet (upload and
    /// move destinations) resolve fine. A `..` with nothing left to pop
    /// means the path escapes the root and is rejected. Leading slashes
    /// are tolerated and interpreted relative to the root; an empty path
    /// resolves to the root itself.
    pub fn resolve(&self, client_path: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();

        for component in Path::new(client_path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir | Component::RootDir => {}
                Component::ParentDir => {
                    if !resolved.pop() || !resolved.starts_with(&self.root) {
                        return Err(StorageError::InvalidPath(client_path.to_string()));
                    }
                }
                Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath(client_path.to_string()));
                }
            }
        }

        // The construction above cannot leave the root, but the prefix
        // check is the contract: resolved must be the root or a strict
        // descendant of it.
        if !resolved.starts_with(&self.root) {
            return Err(StorageError::InvalidPath(client_path.to_string()));
        }

        Ok(resolved)
    }

    /// Map an in-root absolute path back to the forward-slash client form.
    pub fn relative(&self, absolute: &Path) -> String {
        match absolute.strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => String::new(),
        }
    }
}

/// Validate that a client-supplied name is a single path component.
///
/// Rejects empty names and anything carrying separators or traversal
/// segments, so a "filename" can never address outside its folder.
pub fn validate_component(name: &str) -> Result<(), StorageError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StorageError::InvalidPath(name.to_string())),
    }
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
    fn test_empty_path_resolves_to_root() {
        let (_dir, resolver) = resolver();
        assert_eq!(resolver.resolve("").unwrap(), resolver.root());
    }

    #[test]
    fn test_nested_path_resolves_under_root() {
        let (_dir, resolver) = resolver();
        let resolved = resolver.resolve("docs/notes.md").unwrap();
        assert_eq!(resolved, resolver.root().join("docs").join("notes.md"));
    }

    #[test]
    fn test_traversal_outside_root_is_rejected() {
        let (_dir, resolver) = resolver();
        assert!(matches!(
            resolver.resolve(".."),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            resolver.resolve("../sibling"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            resolver.resolve("docs/../../escape"),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_internal_parent_segments_are_fine() {
        let (_dir, resolver) = resolver();
        let resolved = resolver.resolve("docs/../notes.md").unwrap();
        assert_eq!(resolved, resolver.root().join("notes.md"));

        // Climbing to exactly the root is "home", not an escape.
        assert_eq!(resolver.resolve("docs/..").unwrap(), resolver.root());
    }

    #[test]
    fn test_leading_slash_is_relative_to_root() {
        let (_dir, resolver) = resolver();
        let resolved = resolver.resolve("/docs/a.txt").unwrap();
        assert_eq!(resolved, resolver.root().join("docs").join("a.txt"));
    }

    #[test]
    fn test_dot_segments_are_dropped() {
        let (_dir, resolver) = resolver();
        assert_eq!(
            resolver.resolve("./docs/./a.txt").unwrap(),
            resolver.root().join("docs").join("a.txt")
        );
    }

    #[test]
    fn test_relative_round_trip() {
        let (_dir, resolver) = resolver();
        let resolved = resolver.resolve("docs/notes.md").unwrap();
        assert_eq!(resolver.relative(&resolved), "docs/notes.md");
        assert_eq!(resolver.relative(resolver.root()), "");
    }

    #[test]
    fn test_validate_component() {
        assert!(validate_component("notes.md").is_ok());
        assert!(validate_component("").is_err());
        assert!(validate_component("..").is_err());
        assert!(validate_component(".").is_err());
        assert!(validate_component("a/b.txt").is_err());
        assert!(validate_component("../b.txt").is_err());
    }
}
