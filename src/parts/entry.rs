//! Directory scanning and the per-file name state.

use std::fs;
use std::path::{Path, PathBuf};

use crate::parts::RenameError;

/// Separator between name parts.
pub const PART_SEPARATOR: char = '_';

/// A regular file in the scanned directory together with its rename state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file on disk.
    pub path: PathBuf,
    /// Full file name as scanned.
    pub original_name: String,
    /// Extension including the leading dot, or empty.
    pub extension: String,
    /// Parts the new name is built from.
    pub name_parts: Vec<String>,
    /// Name the file gets on copy or move.
    pub new_name: String,
    stem: String,
}

/// Case-insensitive substring filter for file names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Split a file stem into its underscore-delimited parts.
///
/// Always returns at least one part, so an empty stem gives `[""]`.
/// ```rust
/// use part_rename::parts::split_stem;
///
/// assert_eq!(split_stem("report_2024_final"), vec!["report", "2024", "final"]);
/// assert_eq!(split_stem("a__b"), vec!["a", "", "b"]);
/// ```
#[must_use]
pub fn split_stem(stem: &str) -> Vec<String> {
    stem.split(PART_SEPARATOR).map(str::to_string).collect()
}

/// Split a user-typed stem into parts, where an empty stem means no parts at all.
///
/// ```rust
/// use part_rename::parts::example_parts;
///
/// assert_eq!(example_parts("a_c_X"), vec!["a", "c", "X"]);
/// assert!(example_parts("").is_empty());
/// ```
#[must_use]
pub fn example_parts(stem: &str) -> Vec<String> {
    if stem.is_empty() { Vec::new() } else { split_stem(stem) }
}

/// Build a file name from parts and an extension.
///
/// Empty parts produce just the extension.
/// ```rust
/// use part_rename::parts::build_name;
///
/// assert_eq!(build_name(&["report", "final"], ".txt"), "report_final.txt");
/// assert_eq!(build_name::<&str>(&[], ".txt"), ".txt");
/// ```
#[must_use]
pub fn build_name<S: AsRef<str>>(parts: &[S], extension: &str) -> String {
    let mut name = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&PART_SEPARATOR.to_string());
    name.push_str(extension);
    name
}

impl FileEntry {
    /// Create an entry for the given file path.
    pub fn from_path(path: PathBuf) -> anyhow::Result<Self> {
        let (stem, extension) = crate::get_normalized_file_name_and_extension(&path)?;
        let extension = if extension.is_empty() {
            extension
        } else {
            format!(".{extension}")
        };
        Ok(Self::new(path, stem, extension))
    }

    /// Create an entry from already split name components.
    #[must_use]
    pub fn new(path: PathBuf, stem: String, extension: String) -> Self {
        let original_name = format!("{stem}{extension}");
        Self {
            name_parts: split_stem(&stem),
            new_name: original_name.clone(),
            original_name,
            extension,
            path,
            stem,
        }
    }

    /// File name without its extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Strip this file's extension from a typed name when it is present.
    #[must_use]
    pub fn strip_extension<'a>(&self, name: &'a str) -> &'a str {
        name.strip_suffix(self.extension.as_str()).unwrap_or(name)
    }

    /// Parts of the original stem, regardless of any edits.
    #[must_use]
    pub fn original_parts(&self) -> Vec<String> {
        split_stem(&self.stem)
    }

    /// True when the new name differs from the scanned name.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.new_name != self.original_name
    }

    /// Replace the name parts and rebuild the new name from them.
    pub fn set_parts(&mut self, parts: Vec<String>) {
        self.new_name = build_name(&parts, &self.extension);
        self.name_parts = parts;
    }

    /// Drop all edits.
    pub fn reset(&mut self) {
        self.set_parts(self.original_parts());
    }
}

impl NameFilter {
    #[must_use]
    pub const fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Check if the file name passes the include and exclude patterns.
    #[must_use]
    pub fn accepts(&self, file_name: &str) -> bool {
        let file_name = file_name.to_lowercase();
        // Skip files that don't match include patterns (if any specified)
        if !self.include.is_empty()
            && !self
                .include
                .iter()
                .any(|pattern| file_name.contains(&pattern.to_lowercase()))
        {
            return false;
        }
        !self
            .exclude
            .iter()
            .any(|pattern| file_name.contains(&pattern.to_lowercase()))
    }
}

/// List the regular files directly inside `directory`.
///
/// Entries are sorted case-insensitively by name.
/// Any error while listing aborts the whole scan.
pub fn scan_directory(directory: &Path, filter: &NameFilter) -> Result<Vec<FileEntry>, RenameError> {
    let unreadable = |source| RenameError::DirectoryUnreadable {
        path: directory.to_path_buf(),
        source,
    };

    if directory.exists() && !directory.is_dir() {
        return Err(RenameError::NotADirectory(directory.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(directory).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        // Follows symlinks like a plain `is_file` check
        if !path.is_file() {
            continue;
        }
        let file_name = crate::path_to_filename_string(&path);
        if !filter.accepts(&file_name) {
            continue;
        }
        match FileEntry::from_path(path) {
            Ok(file) => entries.push(file),
            Err(error) => crate::print_warning!("Skipping {file_name}: {error}"),
        }
    }

    entries.sort_by(|a, b| {
        a.original_name
            .to_lowercase()
            .cmp(&b.original_name.to_lowercase())
            .then_with(|| a.original_name.cmp(&b.original_name))
    });

    Ok(entries)
}

#[cfg(test)]
mod entry_tests {
    use super::*;

    use std::fs::File;

    use tempfile::tempdir;

    fn entry(name: &str) -> FileEntry {
        FileEntry::from_path(PathBuf::from("/data").join(name)).unwrap()
    }

    #[test]
    fn strip_extension_only_removes_own_extension() {
        let file = entry("a_b.txt");
        assert_eq!(file.strip_extension("b_a.txt"), "b_a");
        assert_eq!(file.strip_extension("b_a"), "b_a");
        assert_eq!(file.strip_extension("b_a.jpg"), "b_a.jpg");
        assert_eq!(entry("notes").strip_extension("new_notes"), "new_notes");
    }

    #[test]
    fn split_then_join_reconstructs_stem() {
        for stem in ["report_2024_final", "single", "", "_leading", "trailing_", "a__b", "__", "ä_ö_å"] {
            let parts = split_stem(stem);
            assert_eq!(build_name(&parts, ""), stem, "round trip failed for {stem:?}");
        }
    }

    #[test]
    fn new_entry_is_unchanged() {
        let file = entry("report_2024_final.txt");
        assert_eq!(file.original_name, "report_2024_final.txt");
        assert_eq!(file.new_name, file.original_name);
        assert_eq!(file.extension, ".txt");
        assert_eq!(file.name_parts, vec!["report", "2024", "final"]);
        assert!(!file.is_changed());
    }

    #[test]
    fn extension_uses_last_dot_only() {
        let file = entry("backup_db.tar.gz");
        assert_eq!(file.stem(), "backup_db.tar");
        assert_eq!(file.extension, ".gz");
        assert_eq!(file.name_parts, vec!["backup", "db.tar"]);
    }

    #[test]
    fn dotfile_has_no_extension() {
        let file = entry(".env_local");
        assert_eq!(file.stem(), ".env_local");
        assert_eq!(file.extension, "");
        assert_eq!(file.name_parts, vec![".env", "local"]);
    }

    #[test]
    fn set_parts_rebuilds_new_name() {
        let mut file = entry("report_2024_final.txt");
        file.set_parts(vec!["report".to_string(), "final".to_string()]);
        assert_eq!(file.new_name, "report_final.txt");
        assert!(file.is_changed());
    }

    #[test]
    fn empty_parts_keep_only_extension() {
        let mut file = entry("report_2024.txt");
        file.set_parts(Vec::new());
        assert_eq!(file.new_name, ".txt");
    }

    #[test]
    fn reset_restores_original_parts() {
        let mut file = entry("a_b_c.txt");
        file.set_parts(vec!["X".to_string()]);
        file.reset();
        assert_eq!(file.name_parts, vec!["a", "b", "c"]);
        assert!(!file.is_changed());
    }

    #[test]
    fn filter_include_and_exclude() {
        let filter = NameFilter::new(vec!["IMG".to_string()], vec!["raw".to_string()]);
        assert!(filter.accepts("img_0001.jpg"));
        assert!(!filter.accepts("img_0001_RAW.dng"));
        assert!(!filter.accepts("notes.txt"));
        assert!(NameFilter::default().accepts("anything"));
    }

    #[test]
    fn scan_lists_only_regular_files_sorted() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("b_two.txt")).unwrap();
        File::create(dir.path().join("A_one.txt")).unwrap();
        File::create(dir.path().join("c_three")).unwrap();
        fs::create_dir(dir.path().join("sub_dir")).unwrap();
        File::create(dir.path().join("sub_dir").join("nested_file.txt")).unwrap();

        let files = scan_directory(dir.path(), &NameFilter::default()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.original_name.as_str()).collect();
        assert_eq!(names, vec!["A_one.txt", "b_two.txt", "c_three"]);
        assert!(files.iter().all(|f| !f.is_changed()));
    }

    #[test]
    fn scan_applies_filter() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("keep_me.txt")).unwrap();
        File::create(dir.path().join("drop_me.txt")).unwrap();

        let filter = NameFilter::new(Vec::new(), vec!["drop".to_string()]);
        let files = scan_directory(dir.path(), &filter).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].original_name, "keep_me.txt");
    }

    #[test]
    fn scan_missing_directory_is_unreadable() {
        let dir = tempdir().unwrap();
        let result = scan_directory(&dir.path().join("missing"), &NameFilter::default());
        assert!(matches!(result, Err(RenameError::DirectoryUnreadable { .. })));
    }

    #[test]
    fn scan_file_path_is_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a_b.txt");
        File::create(&file).unwrap();
        let result = scan_directory(&file, &NameFilter::default());
        assert!(matches!(result, Err(RenameError::NotADirectory(_))));
    }
}
