//! Error classification
//!
//! Maps domain errors to HTTP status codes and stable wire error kinds.

use axum::http::StatusCode;

use crate::error::types::{ChatError, ServerError, StorageError};

/// Classify an error into an HTTP status and the `kind` field of the
/// error envelope.
pub fn classify(error: &ServerError) -> (StatusCode, &'static str) {
    match error {
        ServerError::Storage(e) => classify_storage(e),
        ServerError::Chat(ChatError::EmptyMessage) => (StatusCode::BAD_REQUEST, "empty_message"),
        ServerError::Chat(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_failure"),
        ServerError::IoError(_) | ServerError::TaskFailed(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "io_failure")
        }
    }
}

fn classify_storage(error: &StorageError) -> (StatusCode, &'static str) {
    match error {
        StorageError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "invalid_path"),
        StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        StorageError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
        StorageError::InvalidTarget(_) => (StatusCode::BAD_REQUEST, "invalid_target"),
        StorageError::WriteFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "write_failed"),
        StorageError::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_failure"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_client_statuses() {
        let (status, kind) = classify(&ServerError::Storage(StorageError::InvalidPath(
            "../etc".into(),
        )));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(kind, "invalid_path");

        let (status, kind) =
            classify(&ServerError::Storage(StorageError::NotFound("a.txt".into())));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(kind, "not_found");

        let (status, kind) = classify(&ServerError::Storage(StorageError::AlreadyExists(
            "b.txt".into(),
        )));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(kind, "already_exists");
    }

    #[test]
    fn test_io_errors_are_server_faults() {
        let io = std::io::Error::other("read-only filesystem");
        let (status, kind) = classify(&ServerError::Storage(StorageError::IoError(io)));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "io_failure");
    }
}
