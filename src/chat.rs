//! Chat log
//!
//! A trivial persisted chat feed: one JSON file holding the full message
//! array. Reads and writes are unsynchronized, so two concurrent appends
//! can lose a message. Accepted limitation.

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ChatError;

/// One persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Append-only message log backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read all messages; a missing log file is an empty feed.
    pub fn messages(&self) -> Result<Vec<ChatMessage>, ChatError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ChatError::IoError(e)),
        };

        serde_json::from_str(&data).map_err(ChatError::Corrupt)
    }

    /// Append a message, assigning its id and timestamp. Text is
    /// trimmed; empty text is rejected; the sender defaults to "You".
    pub fn append(&self, text: &str, sender: Option<&str>) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            sender: sender.unwrap_or("You").to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };

        let mut messages = self.messages()?;
        messages.push(message.clone());
        self.write(&messages)?;

        info!("Chat message appended by {}", message.sender);
        Ok(message)
    }

    /// Drop every message, leaving an empty array on disk.
    pub fn clear(&self) -> Result<(), ChatError> {
        self.write(&[])
    }

    fn write(&self, messages: &[ChatMessage]) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(messages).map_err(ChatError::Corrupt)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> (tempfile::TempDir, ChatLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = ChatLog::new(dir.path().join("meta").join("chat.json"));
        (dir, log)
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let (_dir, log) = log();
        assert!(log.messages().unwrap().is_empty());
    }

    #[test]
    fn test_append_round_trips() {
        let (_dir, log) = log();
        let sent = log.append("  hello there  ", Some("alex")).unwrap();

        assert_eq!(sent.text, "hello there");
        assert_eq!(sent.sender, "alex");
        assert!(!sent.id.is_empty());
        assert!(!sent.timestamp.is_empty());

        let messages = log.messages().unwrap();
        assert_eq!(messages, vec![sent]);
    }

    #[test]
    fn test_sender_defaults() {
        let (_dir, log) = log();
        let sent = log.append("hi", None).unwrap();
        assert_eq!(sent.sender, "You");
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let (_dir, log) = log();
        assert!(matches!(
            log.append("   ", None),
            Err(ChatError::EmptyMessage)
        ));
        assert!(log.messages().unwrap().is_empty());
    }

    #[test]
    fn test_clear_leaves_empty_array_on_disk() {
        let (dir, log) = log();
        log.append("one", None).unwrap();
        log.append("two", None).unwrap();
        log.clear().unwrap();

        assert!(log.messages().unwrap().is_empty());
        let raw = fs::read_to_string(dir.path().join("meta").join("chat.json")).unwrap();
        assert_eq!(raw.trim(), "[]");
    }

    #[test]
    fn test_corrupt_log_is_reported() {
        let (dir, log) = log();
        fs::create_dir_all(dir.path().join("meta")).unwrap();
        fs::write(dir.path().join("meta").join("chat.json"), "not json").unwrap();
        assert!(matches!(log.messages(), Err(ChatError::Corrupt(_))));
    }
}
