//! The durable undo ledger.
//!
//! Every organize or clean run records its successful actions in a ledger
//! persisted as JSON inside the organized root, keyed by destination path.
//! Exactly one ledger exists at a time: a new run replaces any unconsumed
//! ledger, and a single undo invocation consumes (deletes) it. Records
//! carry a sequence ordinal so the keyed file still replays in reverse
//! execution order.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LEDGER_FILE_NAME;

/// Errors around ledger persistence.
#[derive(Debug)]
pub enum LedgerError {
    /// No ledger file exists; there is nothing to undo.
    NoLedger,
    /// Failed to read the ledger file.
    ReadFailed { source: std::io::Error },
    /// Failed to write or delete the ledger file.
    WriteFailed { source: std::io::Error },
    /// The ledger file exists but does not parse.
    InvalidFormat { reason: String },
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLedger => write!(f, "No undo ledger found"),
            Self::ReadFailed { source } => write!(f, "Failed to read undo ledger: {}", source),
            Self::WriteFailed { source } => write!(f, "Failed to write undo ledger: {}", source),
            Self::InvalidFormat { reason } => write!(f, "Invalid undo ledger format: {}", reason),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// What a ledger record did to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAction {
    Move,
    Delete,
}

/// One recorded action, keyed in the ledger by its destination path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub action: LedgerAction,
    /// Original location for moves; absent for deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PathBuf>,
    /// Execution ordinal, ascending in the order actions completed.
    pub seq: u64,
}

/// One batch's worth of completed actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoLedger {
    /// RFC 3339 timestamp of the run that produced this ledger.
    pub timestamp: String,
    /// Destination path to the record that produced it.
    pub actions: HashMap<String, LedgerEntry>,
}

impl UndoLedger {
    /// Creates an empty ledger stamped with the current time.
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            actions: HashMap::new(),
        }
    }

    /// Records a completed move from `source` to `destination`.
    pub fn record_move(&mut self, source: &Path, destination: &Path) {
        let seq = self.actions.len() as u64;
        self.actions.insert(
            destination.to_string_lossy().to_string(),
            LedgerEntry {
                action: LedgerAction::Move,
                from: Some(source.to_path_buf()),
                seq,
            },
        );
    }

    /// Records a completed deletion. Deletions cannot be reversed; undo
    /// reports them as unrestorable.
    pub fn record_delete(&mut self, path: &Path) {
        let seq = self.actions.len() as u64;
        self.actions.insert(
            path.to_string_lossy().to_string(),
            LedgerEntry {
                action: LedgerAction::Delete,
                from: None,
                seq,
            },
        );
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no action was recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Records sorted newest-first, the order undo must replay them in.
    pub fn records_newest_first(&self) -> Vec<(&String, &LedgerEntry)> {
        let mut records: Vec<_> = self.actions.iter().collect();
        records.sort_by(|a, b| b.1.seq.cmp(&a.1.seq));
        records
    }

    fn file_path(root: &Path) -> PathBuf {
        root.join(LEDGER_FILE_NAME)
    }

    /// True when a ledger file exists under `root`.
    pub fn exists(root: &Path) -> bool {
        Self::file_path(root).exists()
    }

    /// Persists this ledger under `root`, replacing any previous one.
    pub fn save(&self, root: &Path) -> LedgerResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::InvalidFormat {
                reason: e.to_string(),
            })?;
        fs::write(Self::file_path(root), json)
            .map_err(|source| LedgerError::WriteFailed { source })
    }

    /// Loads the ledger persisted under `root`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NoLedger`] when no ledger file exists; callers treat
    /// this as "nothing to undo", not a failure.
    pub fn load(root: &Path) -> LedgerResult<Self> {
        let path = Self::file_path(root);
        if !path.exists() {
            return Err(LedgerError::NoLedger);
        }

        let json = fs::read_to_string(&path).map_err(|source| LedgerError::ReadFailed { source })?;
        serde_json::from_str(&json).map_err(|e| LedgerError::InvalidFormat {
            reason: e.to_string(),
        })
    }

    /// Removes the ledger file under `root`, if present.
    pub fn delete(root: &Path) -> LedgerResult<()> {
        let path = Self::file_path(root);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| LedgerError::WriteFailed { source })?;
        }
        Ok(())
    }
}

impl Default for UndoLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_records_keep_execution_order() {
        let mut ledger = UndoLedger::new();
        ledger.record_move(Path::new("/a/1.jpg"), Path::new("/a/Images/1.jpg"));
        ledger.record_delete(Path::new("/a/junk.tmp"));
        ledger.record_move(Path::new("/a/2.pdf"), Path::new("/a/Documents/2.pdf"));

        let records = ledger.records_newest_first();
        let keys: Vec<&str> = records.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["/a/Documents/2.pdf", "/a/junk.tmp", "/a/Images/1.jpg"]
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        let mut ledger = UndoLedger::new();
        ledger.record_move(Path::new("/a/1.jpg"), Path::new("/a/Images/1.jpg"));
        ledger.record_delete(Path::new("/a/junk.tmp"));
        ledger.save(root).expect("save should succeed");

        let loaded = UndoLedger::load(root).expect("load should succeed");
        assert_eq!(loaded.len(), 2);

        let entry = &loaded.actions["/a/Images/1.jpg"];
        assert_eq!(entry.action, LedgerAction::Move);
        assert_eq!(entry.from.as_deref(), Some(Path::new("/a/1.jpg")));

        let junk = &loaded.actions["/a/junk.tmp"];
        assert_eq!(junk.action, LedgerAction::Delete);
        assert!(junk.from.is_none());
    }

    #[test]
    fn test_load_without_ledger_is_no_ledger() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(matches!(
            UndoLedger::load(temp_dir.path()),
            Err(LedgerError::NoLedger)
        ));
    }

    #[test]
    fn test_save_replaces_previous_ledger() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        let mut first = UndoLedger::new();
        first.record_move(Path::new("/a/old.jpg"), Path::new("/a/Images/old.jpg"));
        first.save(root).expect("save should succeed");

        let second = UndoLedger::new();
        second.save(root).expect("save should succeed");

        let loaded = UndoLedger::load(root).expect("load should succeed");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_delete_consumes_ledger() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        UndoLedger::new().save(root).expect("save should succeed");
        assert!(UndoLedger::exists(root));

        UndoLedger::delete(root).expect("delete should succeed");
        assert!(!UndoLedger::exists(root));
        // Deleting again is a harmless no-op.
        UndoLedger::delete(root).expect("second delete should succeed");
    }

    #[test]
    fn test_corrupt_ledger_is_invalid_format() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        std::fs::write(root.join(LEDGER_FILE_NAME), "not json").unwrap();

        assert!(matches!(
            UndoLedger::load(root),
            Err(LedgerError::InvalidFormat { .. })
        ));
    }
}
