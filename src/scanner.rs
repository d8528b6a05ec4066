//! Recursive directory scanning with skip-subtree pruning.
//!
//! The scanner walks a root depth-first and yields one [`ScanEntry`] per
//! regular file, never descending into skip-listed directories. Entries
//! that fail to stat (permission errors, broken symlinks) are dropped and
//! the walk continues; a scan is a one-shot batch, not a watcher.

use std::path::PathBuf;
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::category::extension_of;
use crate::config::CompiledRules;

/// A regular file encountered during a scan.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    /// Full path of the file.
    pub path: PathBuf,
    /// Lowercased extension including the leading dot, empty when absent.
    pub extension: String,
    /// Last modification time.
    pub modified: SystemTime,
    /// File size in bytes.
    pub size: u64,
}

/// Walks `root` and collects every organizable file.
///
/// Skip-listed directories are pruned before descent, so their contents are
/// never enumerated. File-level rules (hidden files, exclude globs, the
/// organizer's own state files) are applied here as well, keeping every
/// downstream consumer on the same view of the tree.
pub fn walk(root: &std::path::Path, rules: &CompiledRules) -> Vec<ScanEntry> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !rules.is_skipped(entry.path()))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| rules.should_visit(entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let path = entry.into_path();
            let extension = extension_of(&path);
            Some(ScanEntry {
                path,
                extension,
                modified,
                size: metadata.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use std::fs;
    use tempfile::TempDir;

    fn rules(overrides: RuleConfig) -> CompiledRules {
        let config = crate::config::OrganizerConfig {
            rules: overrides,
            ..Default::default()
        };
        config.compile().expect("rules should compile")
    }

    #[test]
    fn test_walk_yields_nested_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("top.jpg"), b"x").unwrap();
        fs::create_dir_all(temp_dir.path().join("sub/inner")).unwrap();
        fs::write(temp_dir.path().join("sub/inner/deep.pdf"), b"y").unwrap();

        let entries = walk(temp_dir.path(), &rules(RuleConfig::default()));

        let mut names: Vec<String> = entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["deep.pdf", "top.jpg"]);
    }

    #[test]
    fn test_walk_prunes_skip_subtrees() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp_dir.path().join("Android/data")).unwrap();
        fs::write(temp_dir.path().join("Android/data/secret.jpg"), b"x").unwrap();
        fs::write(temp_dir.path().join("visible.jpg"), b"y").unwrap();

        let entries = walk(
            temp_dir.path(),
            &rules(RuleConfig {
                skip_fragments: vec!["Android/data".to_string()],
                ..Default::default()
            }),
        );

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.ends_with("visible.jpg"));
    }

    #[test]
    fn test_walk_populates_entry_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("photo.JPG"), b"12345").unwrap();

        let entries = walk(temp_dir.path(), &rules(RuleConfig::default()));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].extension, ".jpg");
        assert_eq!(entries[0].size, 5);
    }

    #[test]
    fn test_walk_skips_hidden_and_state_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join(".hidden"), b"x").unwrap();
        fs::write(temp_dir.path().join(crate::config::LEDGER_FILE_NAME), b"{}").unwrap();
        fs::write(temp_dir.path().join("real.txt"), b"y").unwrap();

        let entries = walk(temp_dir.path(), &rules(RuleConfig::default()));

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.ends_with("real.txt"));
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let entries = walk(temp_dir.path(), &rules(RuleConfig::default()));
        assert!(entries.is_empty());
    }
}
