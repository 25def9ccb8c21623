//! File-based conversation history.
//!
//! Each conversation is one JSON array of `{role, content, timestamp?}`
//! records at `<dir>/<conversation id>.json`. The first record carries the
//! conversation's creation time, stamped on first save.

use bashpilot_core::message::ConversationRecord;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid conversation id: {0:?}")]
    InvalidId(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt conversation file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One line of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    /// Content of the first record.
    pub preview: String,
    pub timestamp: String,
}

/// Conversations persisted as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A fresh conversation id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn path(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\'])
            && !id.contains("..");
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    /// Load a conversation. An unknown id is an empty conversation.
    pub fn load(&self, id: &str) -> Result<Vec<ConversationRecord>, StoreError> {
        let path = self.path(id)?;
        Self::read(&path)
    }

    fn read(path: &Path) -> Result<Vec<ConversationRecord>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save a conversation, stamping the first record if it has no
    /// timestamp yet.
    pub fn save(&self, id: &str, records: &mut [ConversationRecord]) -> Result<(), StoreError> {
        let path = self.path(id)?;

        if let Some(first) = records.first_mut() {
            if first.timestamp.is_none() {
                first.timestamp = Some(Local::now().format(TIMESTAMP_FORMAT).to_string());
            }
        }

        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let content = serde_json::to_string(&records).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, content).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(conversation = %id, records = records.len(), "Saved conversation");
        Ok(())
    }

    /// All non-empty conversations, newest first.
    ///
    /// Unreadable files are skipped with a warning. A conversation without a
    /// stored timestamp is dated by its file's modification time.
    pub fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut conversations = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
            else {
                continue;
            };

            let records = match Self::read(&path) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable conversation");
                    continue;
                }
            };
            let Some(first) = records.first() else {
                continue;
            };

            let timestamp = first.timestamp.clone().unwrap_or_else(|| {
                entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .map(|t| DateTime::<Local>::from(t).format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_default()
            });

            conversations.push(ConversationSummary {
                id: id.to_string(),
                preview: first.content.clone(),
                timestamp,
            });
        }

        conversations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashpilot_core::message::Role;

    #[test]
    fn unknown_id_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path());
        assert!(store.load("missing").unwrap().is_empty());
    }

    #[test]
    fn save_stamps_first_record_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path().join("history"));
        let id = ConversationStore::new_id();

        let mut records = vec![
            ConversationRecord::new(Role::User, "list files"),
            ConversationRecord::new(Role::Assistant, "here they are"),
        ];
        store.save(&id, &mut records).unwrap();
        let stamp = records[0].timestamp.clone().unwrap();
        assert!(records[1].timestamp.is_none());

        store.save(&id, &mut records).unwrap();
        let loaded = store.load(&id).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].timestamp.as_deref(), Some(stamp.as_str()));
        assert_eq!(loaded[1].content, "here they are");
    }

    #[test]
    fn list_is_newest_first_and_skips_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path());

        let mut old = vec![ConversationRecord {
            role: "user".into(),
            content: "older".into(),
            timestamp: Some("2024-01-01T00:00:00.000000".into()),
        }];
        let mut new = vec![ConversationRecord {
            role: "user".into(),
            content: "newer".into(),
            timestamp: Some("2024-06-01T00:00:00.000000".into()),
        }];
        store.save("a", &mut old).unwrap();
        store.save("b", &mut new).unwrap();
        store.save("empty", &mut []).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a conversation").unwrap();

        let list = store.list().unwrap();
        let ids: Vec<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(list[0].preview, "newer");
    }

    #[test]
    fn corrupt_files_are_skipped_in_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path());
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let mut ok = vec![ConversationRecord::new(Role::User, "fine")];
        store.save("good", &mut ok).unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(matches!(store.load("bad"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn path_traversal_is_rejected() {
        let store = ConversationStore::new("/tmp/unused");
        for id in ["", "../etc/passwd", "a/b", ".hidden"] {
            assert!(matches!(store.load(id), Err(StoreError::InvalidId(_))));
        }
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }
}
