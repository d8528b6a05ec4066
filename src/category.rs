//! Extension-based file classification.
//!
//! Maps file extensions to category names ("Images", "Documents", ...)
//! through a table built from configuration, optionally restricted to a
//! caller-selected subset of categories.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Directory label used for unmatched extensions when routing is enabled.
pub const UNMATCHED_CATEGORY: &str = "Others";

/// The built-in category table: category name to dotted extensions.
///
/// Extension lists keep their configured order; category iteration order is
/// alphabetical, which keeps menus and summaries stable between runs.
pub fn default_categories() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        (
            "Images",
            &[
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".raw", ".arw", ".cr2",
            ],
        ),
        ("Videos", &[".mp4", ".avi", ".mov", ".mkv", ".flv", ".wmv"]),
        (
            "Documents",
            &[
                ".pdf", ".doc", ".docx", ".txt", ".rtf", ".xlsx", ".xls", ".csv", ".xml", ".pptx",
            ],
        ),
        ("Music", &[".mp3", ".wav", ".ogg", ".flac", ".m4a"]),
        ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
        ("Executables", &[".exe", ".msi", ".apk", ".deb"]),
    ];

    table
        .iter()
        .map(|(name, exts)| {
            (
                (*name).to_string(),
                exts.iter().map(|e| (*e).to_string()).collect(),
            )
        })
        .collect()
}

/// Which configured categories participate in an organize run.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Every configured category.
    All,
    /// Only the named categories.
    Categories(Vec<String>),
}

/// Raised when a selection names a category the configuration doesn't define.
#[derive(Debug, Clone)]
pub struct UnknownCategory(pub String);

impl std::fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

/// Lowercased extension of a path, including the leading dot.
///
/// Returns an empty string for paths without an extension, so lookups on
/// extensionless files simply find no category.
///
/// # Examples
///
/// ```
/// use filekeeper::category::extension_of;
/// use std::path::Path;
///
/// assert_eq!(extension_of(Path::new("photo.JPG")), ".jpg");
/// assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
/// assert_eq!(extension_of(Path::new("README")), "");
/// ```
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Extension-to-category lookup table for one organize run.
///
/// Built from the configured `{category -> extensions}` map restricted to a
/// [`Selection`]; files whose extension isn't in the active table are left
/// alone unless unmatched routing was enabled in configuration.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    by_extension: HashMap<String, String>,
    route_unmatched: bool,
}

impl CategoryTable {
    /// Builds the active table from configured categories and a selection.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCategory`] if the selection names a category that is
    /// not present in the configuration.
    pub fn build(
        categories: &BTreeMap<String, Vec<String>>,
        selection: &Selection,
        route_unmatched: bool,
    ) -> Result<Self, UnknownCategory> {
        let selected: Vec<&String> = match selection {
            Selection::All => categories.keys().collect(),
            Selection::Categories(names) => {
                let mut picked = Vec::with_capacity(names.len());
                for name in names {
                    let (key, _) = categories
                        .get_key_value(name)
                        .ok_or_else(|| UnknownCategory(name.clone()))?;
                    picked.push(key);
                }
                picked
            }
        };

        let mut by_extension = HashMap::new();
        for name in selected {
            for ext in &categories[name] {
                by_extension.insert(ext.to_lowercase(), name.clone());
            }
        }

        Ok(Self {
            by_extension,
            route_unmatched,
        })
    }

    /// Looks up the category for a dotted extension, case-insensitively.
    ///
    /// Returns `None` for unmatched extensions (including the empty one),
    /// or the catch-all label when unmatched routing is on.
    pub fn classify(&self, extension: &str) -> Option<&str> {
        match self.by_extension.get(&extension.to_lowercase()) {
            Some(category) => Some(category.as_str()),
            None if self.route_unmatched => Some(UNMATCHED_CATEGORY),
            None => None,
        }
    }

    /// Number of extensions in the active table.
    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    /// True when no extension is mapped.
    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}
