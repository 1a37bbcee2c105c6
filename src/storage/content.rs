//! Content preview
//!
//! Reads file content for in-browser preview, classifying files as text
//! or binary by extension and inferring MIME types for binary payloads.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::StorageError;
use crate::storage::resolver::PathResolver;

/// Extensions served as UTF-8 text rather than a binary payload.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "json", "js", "ts", "jsx", "tsx", "css", "html", "md", "xml", "csv", "log",
];

/// Classified file content.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Text { content: String },
    Binary { content: Vec<u8>, mime_type: String },
}

/// A previewable file: classified content plus display metadata.
#[derive(Debug, Clone)]
pub struct Preview {
    pub name: String,
    pub size: u64,
    pub content: FileContent,
}

/// Read a file for preview.
///
/// Text files are decoded as UTF-8; a file wearing a text extension that
/// is not valid UTF-8 is an IO failure, not a silent lossy decode.
pub fn read_content(resolver: &PathResolver, path: &str) -> Result<Preview, StorageError> {
    let target = resolver.resolve(path)?;

    let metadata = fs::metadata(&target).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_string())
        } else {
            StorageError::from(e)
        }
    })?;

    if metadata.is_dir() {
        return Err(StorageError::InvalidTarget(path.to_string()));
    }

    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let content = if is_text(&target) {
        FileContent::Text {
            content: fs::read_to_string(&target)?,
        }
    } else {
        FileContent::Binary {
            content: fs::read(&target)?,
            mime_type: mime_guess::from_path(&target)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    };

    Ok(Preview {
        name,
        size: metadata.len(),
        content,
    })
}

/// Extension-based classification; anything unlisted is binary.
fn is_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
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
    fn test_text_extension_decodes_utf8() {
        let (dir, resolver) = resolver();
        fs::write(dir.path().join("notes.md"), "héllo").unwrap();

        let preview = read_content(&resolver, "notes.md").unwrap();
        assert_eq!(preview.name, "notes.md");
        assert_eq!(
            preview.content,
            FileContent::Text {
                content: "héllo".to_string()
            }
        );
    }

    #[test]
    fn test_known_binary_extension_gets_mime() {
        let (dir, resolver) = resolver();
        let payload = vec![0x89, b'P', b'N', b'G'];
        fs::write(dir.path().join("pic.png"), &payload).unwrap();

        let preview = read_content(&resolver, "pic.png").unwrap();
        match preview.content {
            FileContent::Binary { content, mime_type } => {
                assert_eq!(content, payload);
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("expected binary content, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_extension_defaults_to_octet_stream() {
        let (dir, resolver) = resolver();
        fs::write(dir.path().join("blob.qqq"), [0u8, 1, 2]).unwrap();

        let preview = read_content(&resolver, "blob.qqq").unwrap();
        match preview.content {
            FileContent::Binary { mime_type, .. } => {
                assert_eq!(mime_type, "application/octet-stream");
            }
            other => panic!("expected binary content, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let (dir, resolver) = resolver();
        fs::write(dir.path().join("README.MD"), "caps").unwrap();

        let preview = read_content(&resolver, "README.MD").unwrap();
        assert!(matches!(preview.content, FileContent::Text { .. }));
    }

    #[test]
    fn test_directory_is_invalid_target() {
        let (dir, resolver) = resolver();
        fs::create_dir(dir.path().join("docs")).unwrap();
        assert!(matches!(
            read_content(&resolver, "docs"),
            Err(StorageError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_dir, resolver) = resolver();
        assert!(matches!(
            read_content(&resolver, "ghost.txt"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_in_text_file_is_io_error() {
        let (dir, resolver) = resolver();
        fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            read_content(&resolver, "bad.txt"),
            Err(StorageError::IoError(_))
        ));
    }
}
