//! Reversing the previous organize or clean batch.
//!
//! Undo replays the persisted ledger newest-first: moves go back to their
//! recorded origin, deletions are reported as unrestorable. The ledger is
//! consumed by the attempt: it is removed even when individual records
//! fail, so a batch can be undone exactly once.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::executor::unique_destination;
use crate::ledger::{LedgerAction, LedgerResult, UndoLedger};

/// Outcome of one undo invocation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Files moved back to their original location.
    pub restored: usize,
    /// Deleted files that cannot be brought back.
    pub unrestorable: Vec<PathBuf>,
    /// Records that failed to restore, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Total records processed.
    pub fn total_processed(&self) -> usize {
        self.restored + self.unrestorable.len() + self.failed.len()
    }

    /// True when nothing failed (unrestorable deletions are expected).
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Replays the undo ledger of a previous batch.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent organize or clean run under `root`.
    ///
    /// # Errors
    ///
    /// [`crate::ledger::LedgerError::NoLedger`] when there is no batch to
    /// undo; other variants when the ledger exists but cannot be read or
    /// removed.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File no longer at destination**: recorded as a failure, the
    ///   remaining records still replay.
    /// * **Original location occupied**: the restored file is renamed with
    ///   a ` (n)` suffix, same policy as the forward move.
    /// * **Original parent directory gone**: recreated before restoring.
    /// * **Deletion records**: counted as unrestorable, never a failure.
    pub fn undo(root: &Path) -> LedgerResult<UndoReport> {
        let ledger = UndoLedger::load(root)?;
        let mut report = UndoReport::default();

        for (destination, entry) in ledger.records_newest_first() {
            let destination = PathBuf::from(destination);
            match entry.action {
                LedgerAction::Delete => report.unrestorable.push(destination),
                LedgerAction::Move => {
                    let Some(origin) = entry.from.as_deref() else {
                        report
                            .failed
                            .push((destination, "move record has no origin".to_string()));
                        continue;
                    };
                    match Self::restore(&destination, origin) {
                        Ok(()) => report.restored += 1,
                        Err(e) => report.failed.push((destination, e.to_string())),
                    }
                }
            }
        }

        // Consumed exactly once, regardless of per-record failures.
        UndoLedger::delete(root)?;

        Ok(report)
    }

    fn restore(destination: &Path, origin: &Path) -> io::Result<()> {
        if !destination.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "file is no longer at its recorded destination",
            ));
        }

        if let Some(parent) = origin.parent() {
            fs::create_dir_all(parent)?;
        }

        let target = unique_destination(origin);
        fs::rename(destination, &target)
    }
}
