//! Application state shared by the command line runner and the terminal UI.

use std::path::{Path, PathBuf};

use crate::parts::{
    BatchOperation, BatchReport, FileEntry, NameFilter, OverwritePrompt, PartSelection, RenameError, ReplayReport,
    Rule, batch, example_parts, scan_directory,
};

/// Current directory and the renaming state of its files.
#[derive(Debug, Clone, Default)]
pub struct Session {
    directory: Option<PathBuf>,
    filter: NameFilter,
    files: Vec<FileEntry>,
}

impl Session {
    #[must_use]
    pub const fn new(filter: NameFilter) -> Self {
        Self {
            directory: None,
            filter,
            files: Vec::new(),
        }
    }

    /// Scan `directory` and make it the current directory.
    ///
    /// On failure the session keeps its previous directory and files.
    pub fn open(&mut self, directory: &Path) -> Result<usize, RenameError> {
        let files = scan_directory(directory, &self.filter)?;
        self.directory = Some(directory.to_path_buf());
        self.files = files;
        Ok(self.files.len())
    }

    /// Rescan the current directory, dropping all edits.
    ///
    /// Returns `Ok(None)` when no directory has been opened yet.
    /// A failed rescan clears the file list.
    pub fn refresh(&mut self) -> Result<Option<usize>, RenameError> {
        let Some(directory) = self.directory.as_deref() else {
            return Ok(None);
        };
        match scan_directory(directory, &self.filter) {
            Ok(files) => {
                self.files = files;
                Ok(Some(self.files.len()))
            }
            Err(error) => {
                self.files.clear();
                Err(error)
            }
        }
    }

    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    #[must_use]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    #[must_use]
    pub fn file(&self, index: usize) -> Option<&FileEntry> {
        self.files.get(index)
    }

    /// Open the part editor for a file.
    #[must_use]
    pub fn edit(&self, index: usize) -> Option<PartSelection> {
        self.files.get(index).map(PartSelection::new)
    }

    /// Store an edited selection into the file at `index`.
    pub fn commit_edit(&mut self, index: usize, selection: &PartSelection) -> bool {
        self.files.get_mut(index).is_some_and(|file| {
            selection.commit(file);
            true
        })
    }

    /// Set the name parts of one file directly.
    pub fn set_file_parts(&mut self, index: usize, parts: Vec<String>) -> bool {
        self.files.get_mut(index).is_some_and(|file| {
            file.set_parts(parts);
            true
        })
    }

    /// Drop the edits of one file.
    pub fn reset_file(&mut self, index: usize) {
        if let Some(file) = self.files.get_mut(index) {
            file.reset();
        }
    }

    /// Index of the first edited file, used as the template for "apply to all".
    #[must_use]
    pub fn template_index(&self) -> Option<usize> {
        self.files.iter().position(FileEntry::is_changed)
    }

    /// Template index and the rule derived from it.
    #[must_use]
    pub fn template_rule(&self) -> Option<(usize, Rule)> {
        let index = self.template_index()?;
        Some((index, Rule::from_template(&self.files[index])))
    }

    /// Replay a rule over the files, leaving the file at `skip_index` as is.
    pub fn apply_rule(&mut self, rule: &Rule, skip_index: Option<usize>) -> ReplayReport {
        rule.apply_to_all(&mut self.files, skip_index)
    }

    /// Rename one file after an example and replay the derived rule over the other files.
    ///
    /// `new_name` may carry the file's extension or leave it out.
    /// Returns `Ok(None)` when the example leaves the name unchanged.
    pub fn apply_example(
        &mut self,
        original_name: &str,
        new_name: &str,
    ) -> Result<Option<(usize, Rule, ReplayReport)>, RenameError> {
        let index = self
            .find(original_name)
            .ok_or_else(|| RenameError::FileNotFound(original_name.to_string()))?;

        let file = &mut self.files[index];
        let new_stem = file.strip_extension(new_name);
        let rule = Rule::from_example(file.stem(), new_stem);
        file.set_parts(example_parts(new_stem));
        if !file.is_changed() {
            return Ok(None);
        }

        let report = self.apply_rule(&rule, Some(index));
        Ok(Some((index, rule, report)))
    }

    /// Find a file by its scanned name.
    #[must_use]
    pub fn find(&self, original_name: &str) -> Option<usize> {
        self.files.iter().position(|file| file.original_name == original_name)
    }

    /// Files whose new name differs from the scanned name.
    pub fn pending(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(|file| file.is_changed())
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// `(original, new)` name pairs for every pending file.
    #[must_use]
    pub fn preview(&self) -> Vec<(&str, &str)> {
        self.pending()
            .map(|file| (file.original_name.as_str(), file.new_name.as_str()))
            .collect()
    }

    /// Copy or move all pending files into `destination`.
    ///
    /// After a move that relocated at least one file the directory is rescanned.
    pub fn run_batch(
        &mut self,
        destination: &Path,
        operation: BatchOperation,
        prompt: &mut dyn OverwritePrompt,
    ) -> Result<BatchReport, RenameError> {
        let mut report = batch::run_batch(&self.files, destination, operation, prompt)?;
        if operation == BatchOperation::Move
            && report.succeeded > 0
            && let Err(error) = self.refresh()
        {
            report.rescan_error = Some(error.to_string());
        }
        Ok(report)
    }
}
