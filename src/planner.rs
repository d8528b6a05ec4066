//! Move planning: from scan entries to an executable batch.
//!
//! Planning is pure bookkeeping; no filesystem state changes until the
//! executor runs the plan.

use chrono::{DateTime, Datelike, Local};
use std::path::{Path, PathBuf};

use crate::category::CategoryTable;
use crate::config::CompiledRules;
use crate::scanner::ScanEntry;

/// A single planned filesystem action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedMove {
    /// Move `source` into its category folder.
    Move {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Delete `source` (junk). Deletion cannot be undone.
    Delete { source: PathBuf },
}

impl PlannedMove {
    /// The file the action operates on.
    pub fn source(&self) -> &Path {
        match self {
            PlannedMove::Move { source, .. } | PlannedMove::Delete { source } => source,
        }
    }
}

/// Builds the organize plan for one batch.
///
/// Per entry, in order: skip-listed paths are omitted, protected names are
/// omitted, junk extensions become deletions (taking priority over any
/// category match), and classified files become moves targeting
/// `root/<label>/<basename>`. Files already at their destination are
/// omitted, which keeps a second run over an organized tree a no-op.
pub fn plan(
    root: &Path,
    entries: &[ScanEntry],
    table: &CategoryTable,
    rules: &CompiledRules,
) -> Vec<PlannedMove> {
    let mut planned = Vec::new();

    for entry in entries {
        if rules.is_skipped(&entry.path) || rules.is_protected(&entry.path) {
            continue;
        }

        if rules.is_junk(&entry.extension) {
            planned.push(PlannedMove::Delete {
                source: entry.path.clone(),
            });
            continue;
        }

        let Some(category) = table.classify(&entry.extension) else {
            continue;
        };
        let Some(file_name) = entry.path.file_name() else {
            continue;
        };

        let label = if rules.year_folders {
            format!("{}-{}", modification_year(entry), category)
        } else {
            category.to_string()
        };

        let destination = root.join(label).join(file_name);
        if destination == entry.path {
            continue;
        }

        planned.push(PlannedMove::Move {
            source: entry.path.clone(),
            destination,
        });
    }

    planned
}

/// Builds the junk-cleaning plan: junk-extension files and orphaned
/// numeric-name thumbnails, everywhere outside skip subtrees.
pub fn plan_clean(entries: &[ScanEntry], rules: &CompiledRules) -> Vec<PlannedMove> {
    entries
        .iter()
        .filter(|entry| !rules.is_skipped(&entry.path))
        .filter(|entry| rules.is_junk(&entry.extension) || is_numeric_thumbnail(&entry.path))
        .map(|entry| PlannedMove::Delete {
            source: entry.path.clone(),
        })
        .collect()
}

/// Thumbnail droppings: a purely numeric stem with a jpg extension.
fn is_numeric_thumbnail(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    let extension = crate::category::extension_of(path);
    (extension == ".jpg" || extension == ".jpeg")
        && !stem.is_empty()
        && stem.chars().all(|c| c.is_ascii_digit())
}

fn modification_year(entry: &ScanEntry) -> i32 {
    DateTime::<Local>::from(entry.modified).year()
}
