//! Organizer configuration: category tables, skip lists, and junk rules.
//!
//! Configuration is loaded from TOML and compiled once into matcher
//! structures that the scanner and planner consult for every path. All
//! pattern validation happens at compile time so a malformed table is a
//! startup failure, never a mid-scan surprise.
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! Images = [".jpg", ".png"]
//! Documents = [".pdf", ".txt"]
//!
//! [rules]
//! skip_fragments = ["Android", ".thumbnails"]
//! junk_extensions = [".tmp", ".log"]
//! protected_names = ["(?i)screenshot"]
//! exclude_patterns = ["*.part"]
//! include_hidden = false
//! year_folders = false
//! route_unmatched = false
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::category::default_categories;

/// File name of the persisted undo ledger inside an organized root.
pub const LEDGER_FILE_NAME: &str = ".filekeeper_ledger.json";
/// File name of the persisted hash baseline inside an organized root.
pub const BASELINE_FILE_NAME: &str = ".filekeeper_hashes.json";
/// Per-directory configuration file name.
pub const CONFIG_FILE_NAME: &str = ".filekeeperrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at an explicitly requested path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern in `exclude_patterns`.
    InvalidGlobPattern(String),
    /// Invalid regex in `protected_names`, with the compiler's reason.
    InvalidRegexPattern { pattern: String, reason: String },
    /// A category entry whose extension does not start with a dot.
    InvalidExtension { category: String, extension: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid protected-name pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidExtension {
                category,
                extension,
            } => {
                write!(
                    f,
                    "Extension '{}' in category '{}' must start with a dot",
                    extension, category
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level organizer configuration, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Category name to dotted extension list.
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<String, Vec<String>>,

    /// Path and file rules applied during scanning and planning.
    #[serde(default)]
    pub rules: RuleConfig,
}

/// Skip, junk, and protection rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Path fragments marking subtrees to exclude from every operation.
    #[serde(default = "default_skip_fragments")]
    pub skip_fragments: Vec<String>,

    /// Extensions always slated for deletion instead of classification.
    #[serde(default = "default_junk_extensions")]
    pub junk_extensions: Vec<String>,

    /// Regexes over file names; matching files are never moved.
    #[serde(default = "default_protected_names")]
    pub protected_names: Vec<String>,

    /// Glob patterns excluding additional files from organization.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Whether dotfiles participate in scans. Defaults to false.
    #[serde(default)]
    pub include_hidden: bool,

    /// Prefix destination folders with the file's modification year.
    #[serde(default)]
    pub year_folders: bool,

    /// Route unmatched extensions into the catch-all category.
    #[serde(default)]
    pub route_unmatched: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            skip_fragments: default_skip_fragments(),
            junk_extensions: default_junk_extensions(),
            protected_names: default_protected_names(),
            exclude_patterns: Vec::new(),
            include_hidden: false,
            year_folders: false,
            route_unmatched: false,
        }
    }
}

fn default_skip_fragments() -> Vec<String> {
    ["Android/data", "Android/obb", ".thumbnails", ".cache"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_junk_extensions() -> Vec<String> {
    [".nomedia", ".tmp", ".log", ".bak"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_protected_names() -> Vec<String> {
    vec!["(?i)screenshot".to_string(), r"^\d+\.jpe?g$".to_string()]
}

impl OrganizerConfig {
    /// Load configuration with fallback to defaults.
    ///
    /// Resolution order:
    /// 1. An explicitly provided path (missing file is an error)
    /// 2. `.filekeeperrc.toml` inside the target root
    /// 3. `~/.config/filekeeper/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error when an explicitly provided file cannot be read, or
    /// when any discovered file fails to parse.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = root.join(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("filekeeper")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the rules into matcher structures for path checks.
    ///
    /// # Errors
    ///
    /// Returns an error if any protected-name regex or exclude glob is
    /// invalid, or a category extension is missing its leading dot.
    pub fn compile(&self) -> Result<CompiledRules, ConfigError> {
        for (category, extensions) in &self.categories {
            for extension in extensions {
                if !extension.starts_with('.') {
                    return Err(ConfigError::InvalidExtension {
                        category: category.clone(),
                        extension: extension.clone(),
                    });
                }
            }
        }
        CompiledRules::new(&self.rules)
    }
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            rules: RuleConfig::default(),
        }
    }
}

/// Pre-compiled rule matchers consulted for every scanned path.
pub struct CompiledRules {
    skip_fragments: Vec<String>,
    junk_extensions: HashSet<String>,
    protected_names: Vec<Regex>,
    exclude_patterns: Vec<Pattern>,
    include_hidden: bool,
    /// Prefix destination folders with the modification year.
    pub year_folders: bool,
    /// Route unmatched extensions into the catch-all category.
    pub route_unmatched: bool,
}

impl CompiledRules {
    fn new(rules: &RuleConfig) -> Result<Self, ConfigError> {
        let protected_names = rules
            .protected_names
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_fragments: rules
                .skip_fragments
                .iter()
                .map(|fragment| fragment.replace('\\', "/").to_lowercase())
                .collect(),
            junk_extensions: rules
                .junk_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            protected_names,
            exclude_patterns,
            include_hidden: rules.include_hidden,
            year_folders: rules.year_folders,
            route_unmatched: rules.route_unmatched,
        })
    }

    /// True when any skip fragment appears in the path, case-insensitively.
    ///
    /// Applied to directories during traversal, pruning whole subtrees, and
    /// to full file paths during planning.
    pub fn is_skipped(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/").to_lowercase();
        self.skip_fragments
            .iter()
            .any(|fragment| normalized.contains(fragment))
    }

    /// True when the file's name matches a protected-name pattern.
    ///
    /// Protected files are never classified or moved.
    pub fn is_protected(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();
        self.protected_names.iter().any(|re| re.is_match(&name))
    }

    /// True when the dotted extension is on the junk list.
    pub fn is_junk(&self, extension: &str) -> bool {
        self.junk_extensions.contains(&extension.to_lowercase())
    }

    /// Whether a file participates in scans at all.
    ///
    /// Filters out the organizer's own state files, dotfiles (unless
    /// enabled), and anything matching an exclude glob.
    pub fn should_visit(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if is_state_file(&file_name) {
            return false;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }
}

/// The organizer's own persisted files, always left alone.
fn is_state_file(file_name: &str) -> bool {
    file_name == LEDGER_FILE_NAME
        || file_name == BASELINE_FILE_NAME
        || file_name == CONFIG_FILE_NAME
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(rules: RuleConfig) -> CompiledRules {
        CompiledRules::new(&rules).expect("rules should compile")
    }

    #[test]
    fn test_default_config_compiles() {
        let config = OrganizerConfig::default();
        assert!(config.compile().is_ok());
        assert!(config.categories.contains_key("Images"));
    }

    #[test]
    fn test_skip_fragment_is_case_insensitive_substring() {
        let rules = compiled(RuleConfig {
            skip_fragments: vec!["Android/data".to_string(), ".thumbnails".to_string()],
            ..Default::default()
        });

        assert!(rules.is_skipped(Path::new("/sdcard/android/DATA/secret.jpg")));
        assert!(rules.is_skipped(Path::new("/sdcard/DCIM/.thumbnails")));
        assert!(!rules.is_skipped(Path::new("/sdcard/DCIM/photo.jpg")));
    }

    #[test]
    fn test_junk_extension_is_case_insensitive() {
        let rules = compiled(RuleConfig::default());
        assert!(rules.is_junk(".tmp"));
        assert!(rules.is_junk(".TMP"));
        assert!(!rules.is_junk(".txt"));
    }

    #[test]
    fn test_default_protected_names() {
        let rules = compiled(RuleConfig::default());
        assert!(rules.is_protected(Path::new("Screenshot_2024-01-01.png")));
        assert!(rules.is_protected(Path::new("my screenshot.jpg")));
        assert!(rules.is_protected(Path::new("174522339.jpg")));
        assert!(!rules.is_protected(Path::new("holiday.jpg")));
    }

    #[test]
    fn test_invalid_protected_regex_is_config_error() {
        let result = CompiledRules::new(&RuleConfig {
            protected_names: vec!["[unclosed".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_exclude_glob_is_config_error() {
        let result = CompiledRules::new(&RuleConfig {
            exclude_patterns: vec!["[unclosed".to_string()],
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }

    #[test]
    fn test_hidden_files_excluded_by_default() {
        let rules = compiled(RuleConfig::default());
        assert!(!rules.should_visit(Path::new("/root/.gitignore")));
        assert!(rules.should_visit(Path::new("/root/photo.jpg")));
    }

    #[test]
    fn test_hidden_files_included_when_enabled() {
        let rules = compiled(RuleConfig {
            include_hidden: true,
            ..Default::default()
        });
        assert!(rules.should_visit(Path::new("/root/.profile")));
    }

    #[test]
    fn test_state_files_never_visited() {
        let rules = compiled(RuleConfig {
            include_hidden: true,
            ..Default::default()
        });
        assert!(!rules.should_visit(Path::new(LEDGER_FILE_NAME)));
        assert!(!rules.should_visit(Path::new(BASELINE_FILE_NAME)));
        assert!(!rules.should_visit(Path::new(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_exclude_glob_filters_files() {
        let rules = compiled(RuleConfig {
            exclude_patterns: vec!["*.part".to_string()],
            ..Default::default()
        });
        assert!(!rules.should_visit(Path::new("download.part")));
        assert!(rules.should_visit(Path::new("download.zip")));
    }

    #[test]
    fn test_extension_without_dot_is_rejected() {
        let mut config = OrganizerConfig::default();
        config
            .categories
            .insert("Broken".to_string(), vec!["jpg".to_string()]);
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_parse_config_from_toml() {
        let toml_text = r#"
[categories]
Images = [".jpg"]

[rules]
skip_fragments = ["backup"]
junk_extensions = [".part"]
year_folders = true
"#;
        let config: OrganizerConfig = toml::from_str(toml_text).expect("valid toml");
        assert_eq!(config.categories.len(), 1);
        assert!(config.rules.year_folders);

        let rules = config.compile().expect("compiles");
        assert!(rules.is_skipped(Path::new("/x/Backup/file.jpg")));
        assert!(rules.is_junk(".part"));
    }
}
