//! Content-hash integrity checking between runs.
//!
//! Every check hashes the current tree, diffs it against the persisted
//! baseline, and then replaces the baseline with the fresh map. Each
//! invocation advances the baseline, even when nothing changed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BASELINE_FILE_NAME, CompiledRules};
use crate::hasher;
use crate::output::OutputFormatter;
use crate::scanner;

/// Errors around baseline persistence. A missing baseline is not an error;
/// it just means everything is new.
#[derive(Debug)]
pub enum IntegrityError {
    BaselineRead { source: std::io::Error },
    BaselineWrite { source: std::io::Error },
    BaselineFormat { reason: String },
}

impl std::fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaselineRead { source } => {
                write!(f, "Failed to read hash baseline: {}", source)
            }
            Self::BaselineWrite { source } => {
                write!(f, "Failed to write hash baseline: {}", source)
            }
            Self::BaselineFormat { reason } => {
                write!(f, "Invalid hash baseline format: {}", reason)
            }
        }
    }
}

impl std::error::Error for IntegrityError {}

/// Paths that changed relative to the previous baseline.
///
/// Unchanged files are only counted; the three change sets are disjoint
/// and sorted for stable reporting.
#[derive(Debug, Default)]
pub struct DiffReport {
    /// In the current tree but not the baseline.
    pub new_paths: Vec<PathBuf>,
    /// In both, with differing digests.
    pub modified: Vec<PathBuf>,
    /// In the baseline but gone from the current tree.
    pub deleted: Vec<PathBuf>,
    /// In both with equal digests.
    pub unchanged: usize,
    /// Files that could not be hashed and were left out of the new baseline.
    pub unreadable: usize,
}

impl DiffReport {
    /// True when no additions, modifications, or deletions were found.
    pub fn is_unchanged(&self) -> bool {
        self.new_paths.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// The persisted path-to-digest map from the previous check.
#[derive(Debug, Default)]
struct HashBaseline(BTreeMap<String, String>);

impl HashBaseline {
    fn file_path(root: &Path) -> PathBuf {
        root.join(BASELINE_FILE_NAME)
    }

    /// Loads the baseline under `root`; absent file means an empty map.
    fn load(root: &Path) -> Result<Self, IntegrityError> {
        let path = Self::file_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let json =
            fs::read_to_string(&path).map_err(|source| IntegrityError::BaselineRead { source })?;
        let map = serde_json::from_str(&json).map_err(|e| IntegrityError::BaselineFormat {
            reason: e.to_string(),
        })?;
        Ok(Self(map))
    }

    fn save(&self, root: &Path) -> Result<(), IntegrityError> {
        let json = serde_json::to_string_pretty(&self.0).map_err(|e| {
            IntegrityError::BaselineFormat {
                reason: e.to_string(),
            }
        })?;
        fs::write(Self::file_path(root), json)
            .map_err(|source| IntegrityError::BaselineWrite { source })
    }
}

/// Hashes the tree under `root`, reports changes against the previous
/// baseline, and persists the fresh map as the new baseline.
///
/// Unreadable files are counted and omitted; they neither abort the scan
/// nor poison the baseline.
pub fn check(root: &Path, rules: &CompiledRules) -> Result<DiffReport, IntegrityError> {
    let entries = scanner::walk(root, rules);

    let progress = OutputFormatter::create_progress_bar(entries.len() as u64);
    let mut current: BTreeMap<String, String> = BTreeMap::new();
    let mut unreadable = 0usize;

    for entry in &entries {
        match hasher::hash_file(&entry.path) {
            Ok(digest) => {
                current.insert(entry.path.to_string_lossy().to_string(), digest);
            }
            Err(_) => unreadable += 1,
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let baseline = HashBaseline::load(root)?;

    let mut report = DiffReport {
        unreadable,
        ..Default::default()
    };

    for (path, old_digest) in &baseline.0 {
        match current.get(path) {
            None => report.deleted.push(PathBuf::from(path)),
            Some(digest) if digest != old_digest => report.modified.push(PathBuf::from(path)),
            Some(_) => report.unchanged += 1,
        }
    }
    for path in current.keys() {
        if !baseline.0.contains_key(path) {
            report.new_paths.push(PathBuf::from(path));
        }
    }

    // The baseline advances on every invocation, changed or not.
    HashBaseline(current).save(root)?;

    Ok(report)
}
