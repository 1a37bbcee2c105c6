//! Error types
//!
//! Defines domain-specific error types for each module of the file server.

use std::fmt;
use std::io;

/// Storage module errors
///
/// Paths carried in the variants are the client-relative form, never the
/// real filesystem path.
#[derive(Debug)]
pub enum StorageError {
    /// Client path resolves outside the configured root.
    InvalidPath(String),
    NotFound(String),
    AlreadyExists(String),
    /// Operation attempted on the wrong entry kind (e.g. reading a directory).
    InvalidTarget(String),
    /// A write failed after its destination directory was already created.
    WriteFailed { path: String, source: io::Error },
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Destination already exists: {}", p),
            StorageError::InvalidTarget(p) => write!(f, "Invalid target: {}", p),
            StorageError::WriteFailed { path, source } => {
                write!(f, "Write failed for {}: {}", path, source)
            }
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// Disk probe errors
///
/// All of these are non-fatal: a failed probe degrades the usage
/// snapshot's capacity fields to null instead of failing the request.
#[derive(Debug)]
pub enum ProbeError {
    CommandFailed(io::Error),
    Timeout,
    BadExit(String),
    ParseFailed(String),
    /// The command ran and parsed, but the reading cannot be right.
    Implausible { total: u64, free: u64 },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::CommandFailed(e) => write!(f, "Probe command failed to run: {}", e),
            ProbeError::Timeout => write!(f, "Probe command timed out"),
            ProbeError::BadExit(s) => write!(f, "Probe command failed: {}", s),
            ProbeError::ParseFailed(s) => write!(f, "Unparseable probe output: {}", s),
            ProbeError::Implausible { total, free } => {
                write!(f, "Implausible probe reading: total={} free={}", total, free)
            }
        }
    }
}

impl std::error::Error for ProbeError {}

/// Chat module errors
#[derive(Debug)]
pub enum ChatError {
    EmptyMessage,
    /// The persisted log is not valid JSON.
    Corrupt(serde_json::Error),
    IoError(io::Error),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::EmptyMessage => write!(f, "Message text is required"),
            ChatError::Corrupt(e) => write!(f, "Chat log is corrupt: {}", e),
            ChatError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<io::Error> for ChatError {
    fn from(error: io::Error) -> Self {
        ChatError::IoError(error)
    }
}

/// General server error that encompasses all error types
#[derive(Debug)]
pub enum ServerError {
    Storage(StorageError),
    Chat(ChatError),
    IoError(io::Error),
    /// A blocking task died before producing a result.
    TaskFailed(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Storage(e) => write!(f, "{}", e),
            ServerError::Chat(e) => write!(f, "{}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
            ServerError::TaskFailed(e) => write!(f, "Internal task error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

// Implement conversions from specific errors to ServerError
impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<ChatError> for ServerError {
    fn from(error: ChatError) -> Self {
        ServerError::Chat(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
