//! Plan execution and per-batch reporting.
//!
//! The executor runs a planned batch against the real filesystem. A failed
//! item is recorded and skipped; the rest of the batch always runs. Only
//! actions that actually completed end up in the undo ledger, which is
//! persisted once the whole batch has been attempted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ledger::UndoLedger;
use crate::planner::PlannedMove;

/// Outcome of executing one planned batch.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Files moved into their category folder.
    pub moved: usize,
    /// Junk files deleted.
    pub deleted: usize,
    /// Items that failed, with the reason. Failures never abort the batch.
    pub failed: Vec<(PathBuf, String)>,
    /// Total size of successfully moved files.
    pub bytes_moved: u64,
    /// Set when the undo ledger could not be persisted afterwards.
    pub ledger_error: Option<String>,
}

impl ExecutionReport {
    /// Actions that completed successfully.
    pub fn succeeded(&self) -> usize {
        self.moved + self.deleted
    }

    /// True when every item succeeded and the ledger was saved.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.ledger_error.is_none()
    }
}

/// Executes planned moves and deletions, recording an undo ledger.
pub struct MoveExecutor;

impl MoveExecutor {
    /// Runs `plan` against the filesystem and persists the resulting
    /// ledger under `root`, replacing any unconsumed previous ledger.
    ///
    /// Destination directories are created as needed. When a destination
    /// already exists the file is moved under a ` (n)` suffixed name
    /// instead of overwriting. Per-item failures are collected into the
    /// report; the ledger only ever contains completed actions.
    pub fn execute(root: &Path, plan: &[PlannedMove]) -> ExecutionReport {
        let mut ledger = UndoLedger::new();
        let mut report = ExecutionReport::default();

        for item in plan {
            match item {
                PlannedMove::Move {
                    source,
                    destination,
                } => match Self::move_file(source, destination) {
                    Ok((final_destination, size)) => {
                        report.moved += 1;
                        report.bytes_moved += size;
                        ledger.record_move(source, &final_destination);
                    }
                    Err(e) => report.failed.push((source.clone(), e.to_string())),
                },
                PlannedMove::Delete { source } => match fs::remove_file(source) {
                    Ok(()) => {
                        report.deleted += 1;
                        ledger.record_delete(source);
                    }
                    Err(e) => report.failed.push((source.clone(), e.to_string())),
                },
            }
        }

        if let Err(e) = ledger.save(root) {
            report.ledger_error = Some(e.to_string());
        }

        report
    }

    /// Moves one file, resolving destination collisions by renaming.
    /// Returns the destination actually used and the file's size.
    fn move_file(source: &Path, destination: &Path) -> io::Result<(PathBuf, u64)> {
        let size = fs::metadata(source)?.len();

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let target = unique_destination(destination);
        fs::rename(source, &target)?;
        Ok((target, size))
    }
}

/// First free path at or near `destination`: the path itself when nothing
/// occupies it, otherwise `name (1).ext`, `name (2).ext`, counting up.
pub(crate) fn unique_destination(destination: &Path) -> PathBuf {
    if !destination.exists() {
        return destination.to_path_buf();
    }

    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = destination
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = destination.parent().unwrap_or_else(|| Path::new(""));

    for counter in 1u32.. {
        let candidate = parent.join(format!("{stem} ({counter}){suffix}"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("ran out of collision suffixes");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerAction, UndoLedger};
    use std::fs;
    use tempfile::TempDir;

    fn planned_move(root: &Path, name: &str, category: &str) -> PlannedMove {
        PlannedMove::Move {
            source: root.join(name),
            destination: root.join(category).join(name),
        }
    }

    #[test]
    fn test_execute_moves_and_creates_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("photo.jpg"), b"abcd").unwrap();

        let report = MoveExecutor::execute(root, &[planned_move(root, "photo.jpg", "Images")]);

        assert!(report.is_clean());
        assert_eq!(report.moved, 1);
        assert_eq!(report.bytes_moved, 4);
        assert!(root.join("Images/photo.jpg").exists());
        assert!(!root.join("photo.jpg").exists());
    }

    #[test]
    fn test_execute_deletes_junk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("notes.tmp"), b"junk").unwrap();

        let report = MoveExecutor::execute(
            root,
            &[PlannedMove::Delete {
                source: root.join("notes.tmp"),
            }],
        );

        assert_eq!(report.deleted, 1);
        assert!(!root.join("notes.tmp").exists());
    }

    #[test]
    fn test_collision_renames_instead_of_overwriting() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Images")).unwrap();
        fs::write(root.join("Images/photo.jpg"), b"original").unwrap();
        fs::write(root.join("photo.jpg"), b"incoming").unwrap();

        let report = MoveExecutor::execute(root, &[planned_move(root, "photo.jpg", "Images")]);

        assert_eq!(report.moved, 1);
        assert_eq!(
            fs::read(root.join("Images/photo.jpg")).unwrap(),
            b"original"
        );
        assert_eq!(
            fs::read(root.join("Images/photo (1).jpg")).unwrap(),
            b"incoming"
        );
    }

    #[test]
    fn test_ledger_records_actual_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Images")).unwrap();
        fs::write(root.join("Images/photo.jpg"), b"original").unwrap();
        fs::write(root.join("photo.jpg"), b"incoming").unwrap();

        MoveExecutor::execute(root, &[planned_move(root, "photo.jpg", "Images")]);

        let ledger = UndoLedger::load(root).expect("ledger should exist");
        let key = root.join("Images/photo (1).jpg");
        let entry = &ledger.actions[&key.to_string_lossy().to_string()];
        assert_eq!(entry.action, LedgerAction::Move);
        assert_eq!(entry.from.as_deref(), Some(root.join("photo.jpg").as_path()));
    }

    #[test]
    fn test_failures_do_not_abort_the_batch() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("real.pdf"), b"content").unwrap();

        let plan = vec![
            planned_move(root, "missing.jpg", "Images"),
            planned_move(root, "real.pdf", "Documents"),
        ];
        let report = MoveExecutor::execute(root, &plan);

        assert_eq!(report.moved, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, root.join("missing.jpg"));
        assert!(root.join("Documents/real.pdf").exists());

        // Only the completed action is in the ledger.
        let ledger = UndoLedger::load(root).expect("ledger should exist");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_empty_plan_still_replaces_ledger() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        let mut stale = UndoLedger::new();
        stale.record_delete(Path::new("/gone.tmp"));
        stale.save(root).unwrap();

        let report = MoveExecutor::execute(root, &[]);

        assert!(report.is_clean());
        let ledger = UndoLedger::load(root).expect("ledger should exist");
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unique_destination_counts_past_taken_suffixes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), b"0").unwrap();
        fs::write(root.join("a (1).txt"), b"1").unwrap();

        let target = unique_destination(&root.join("a.txt"));
        assert_eq!(target, root.join("a (2).txt"));
    }
}
