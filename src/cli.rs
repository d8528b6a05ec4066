//! Command orchestration for filekeeper.
//!
//! The CLI layer is glue: it loads and compiles configuration, wires the
//! scanner, planner, and executor together for each subcommand, and prints
//! what the core returns. Per-item failures are printed individually with
//! their path and reason; aggregate counts close every operation.

use std::collections::HashMap;
use std::path::Path;

use crate::category::{CategoryTable, Selection};
use crate::config::{CompiledRules, OrganizerConfig};
use crate::executor::{ExecutionReport, MoveExecutor};
use crate::integrity;
use crate::ledger::LedgerError;
use crate::output::OutputFormatter;
use crate::planner::{self, PlannedMove};
use crate::scanner;
use crate::undo::UndoManager;

/// A resolved command to execute against a root folder.
#[derive(Debug, Clone)]
pub enum Command {
    /// Organize files into category folders, optionally as a preview.
    Organize {
        selection: Selection,
        dry_run: bool,
    },
    /// Delete junk files and orphaned thumbnails.
    Clean,
    /// Revert the previous organize or clean batch.
    Undo,
    /// Report integrity changes since the last check.
    Check,
}

/// Runs one command against `root`.
///
/// # Errors
///
/// Returns a message for unrecoverable startup failures: missing root
/// folder, unreadable or malformed configuration, unknown category
/// selection. Per-item filesystem failures are reported, not returned.
pub fn run(command: Command, root: &Path, config_path: Option<&Path>) -> Result<(), String> {
    if !root.is_dir() {
        return Err(format!("Target folder does not exist: {}", root.display()));
    }

    match command {
        Command::Organize {
            selection,
            dry_run,
        } => organize(root, config_path, &selection, dry_run),
        Command::Clean => clean(root, config_path),
        Command::Undo => undo(root),
        Command::Check => check(root, config_path),
    }
}

fn load_rules(
    root: &Path,
    config_path: Option<&Path>,
) -> Result<(OrganizerConfig, CompiledRules), String> {
    let config = OrganizerConfig::load(root, config_path).map_err(|e| e.to_string())?;
    let rules = config.compile().map_err(|e| e.to_string())?;
    Ok((config, rules))
}

fn organize(
    root: &Path,
    config_path: Option<&Path>,
    selection: &Selection,
    dry_run: bool,
) -> Result<(), String> {
    let (config, rules) = load_rules(root, config_path)?;
    let table = CategoryTable::build(&config.categories, selection, rules.route_unmatched)
        .map_err(|e| e.to_string())?;

    OutputFormatter::info(&format!("Scanning: {}", root.display()));
    let entries = scanner::walk(root, &rules);
    let plan = planner::plan(root, &entries, &table, &rules);

    if dry_run {
        preview_plan(root, &plan);
        return Ok(());
    }

    if plan.is_empty() {
        OutputFormatter::plain("Nothing to organize.");
    }

    let report = MoveExecutor::execute(root, &plan);
    print_execution_report(root, &report);

    if !plan.is_empty() {
        OutputFormatter::summary_table(&category_counts(root, &plan), plan.len());
        OutputFormatter::plain(&format!(
            "Use 'filekeeper undo {}' to revert this run.",
            root.display()
        ));
    }

    Ok(())
}

fn clean(root: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let (_, rules) = load_rules(root, config_path)?;

    OutputFormatter::info(&format!("Cleaning junk under: {}", root.display()));
    let entries = scanner::walk(root, &rules);
    let plan = planner::plan_clean(&entries, &rules);

    if plan.is_empty() {
        OutputFormatter::plain("No junk files found.");
        return Ok(());
    }

    for item in &plan {
        OutputFormatter::plain(&format!(
            " - deleting {}",
            display_path(root, item.source())
        ));
    }

    let report = MoveExecutor::execute(root, &plan);
    print_execution_report(root, &report);

    Ok(())
}

fn undo(root: &Path) -> Result<(), String> {
    match UndoManager::undo(root) {
        Ok(report) => {
            OutputFormatter::success(&format!("Restored: {}", report.restored));

            for path in &report.unrestorable {
                OutputFormatter::warning(&format!(
                    "Cannot restore deleted file: {}",
                    path.display()
                ));
            }
            for (path, reason) in &report.failed {
                OutputFormatter::error(&format!("{}: {}", path.display(), reason));
            }

            if !report.is_clean() {
                OutputFormatter::warning(&format!(
                    "{} of {} records could not be restored.",
                    report.failed.len(),
                    report.total_processed()
                ));
            }
            Ok(())
        }
        Err(LedgerError::NoLedger) => {
            OutputFormatter::plain("Nothing to undo.");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn check(root: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let (_, rules) = load_rules(root, config_path)?;

    OutputFormatter::info(&format!("Checking integrity of: {}", root.display()));
    let report = integrity::check(root, &rules).map_err(|e| e.to_string())?;

    OutputFormatter::header("Integrity Report");
    for path in &report.deleted {
        OutputFormatter::plain(&format!("  Deleted:  {}", path.display()));
    }
    for path in &report.modified {
        OutputFormatter::plain(&format!("  Modified: {}", path.display()));
    }
    for path in &report.new_paths {
        OutputFormatter::plain(&format!("  New file: {}", path.display()));
    }

    if report.is_unchanged() {
        OutputFormatter::success("No changes since the last check.");
    } else {
        OutputFormatter::plain(&format!(
            "{} deleted, {} modified, {} new, {} unchanged",
            report.deleted.len(),
            report.modified.len(),
            report.new_paths.len(),
            report.unchanged
        ));
    }
    if report.unreadable > 0 {
        OutputFormatter::warning(&format!(
            "{} files could not be read and were skipped.",
            report.unreadable
        ));
    }

    Ok(())
}

/// Prints the plan without executing anything.
fn preview_plan(root: &Path, plan: &[PlannedMove]) {
    if plan.is_empty() {
        OutputFormatter::dry_run_notice("Nothing would change.");
        return;
    }

    for item in plan {
        match item {
            PlannedMove::Move {
                source,
                destination,
            } => OutputFormatter::plain(&format!(
                " - {} → {}",
                display_path(root, source),
                display_path(root, destination)
            )),
            PlannedMove::Delete { source } => OutputFormatter::plain(&format!(
                " - {} → deleted (junk)",
                display_path(root, source)
            )),
        }
    }

    OutputFormatter::summary_table(&category_counts(root, plan), plan.len());
    OutputFormatter::dry_run_notice("No files were modified.");
}

fn print_execution_report(root: &Path, report: &ExecutionReport) {
    for (path, reason) in &report.failed {
        OutputFormatter::error(&format!("{}: {}", display_path(root, path), reason));
    }

    OutputFormatter::success(&format!(
        "{} moved ({}), {} deleted, {} failed",
        report.moved,
        format_size(report.bytes_moved),
        report.deleted,
        report.failed.len()
    ));

    if let Some(reason) = &report.ledger_error {
        OutputFormatter::warning(&format!(
            "Could not save the undo ledger: {}. Undo will not be available.",
            reason
        ));
    }
}

/// Per-destination-folder counts for the summary table; deletions are
/// grouped under their own label.
fn category_counts(root: &Path, plan: &[PlannedMove]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for item in plan {
        let label = match item {
            PlannedMove::Move { destination, .. } => destination
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| "?".to_string()),
            PlannedMove::Delete { .. } => "(deleted)".to_string(),
        };
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

fn display_path<'a>(root: &Path, path: &'a Path) -> std::borrow::Cow<'a, str> {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
}

fn format_size(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}
