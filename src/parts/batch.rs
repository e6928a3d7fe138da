//! Copy or move renamed files into a destination directory.

use std::fmt;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use crate::parts::{FileEntry, RenameError};

/// Maximum number of error messages shown in a batch summary.
pub const MAX_SHOWN_ERRORS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Copy,
    Move,
}

/// Asks whether an existing destination file may be replaced.
pub trait OverwritePrompt {
    fn confirm_overwrite(&mut self, target: &Path) -> bool;
}

/// Answers every overwrite prompt with the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

/// What happened to one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Done { source: PathBuf, target: PathBuf },
    Declined { source: PathBuf, target: PathBuf },
    Failed { source: PathBuf, target: PathBuf, error: String },
}

/// Counts and messages from a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub operation: BatchOperation,
    pub succeeded: usize,
    pub declined: usize,
    pub errors: Vec<String>,
    pub outcomes: Vec<FileOutcome>,
    /// Set when rescanning the source directory after a move failed.
    pub rescan_error: Option<String>,
}

impl OverwritePrompt for FixedAnswer {
    fn confirm_overwrite(&mut self, _target: &Path) -> bool {
        self.0
    }
}

impl<F: FnMut(&Path) -> bool> OverwritePrompt for F {
    fn confirm_overwrite(&mut self, target: &Path) -> bool {
        self(target)
    }
}

impl BatchOperation {
    /// Verb for messages and logs.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }

    /// Past tense verb for result summaries.
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Copy => "Copied",
            Self::Move => "Moved",
        }
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verb())
    }
}

impl BatchReport {
    const fn new(operation: BatchOperation) -> Self {
        Self {
            operation,
            succeeded: 0,
            declined: 0,
            errors: Vec::new(),
            outcomes: Vec::new(),
            rescan_error: None,
        }
    }

    #[must_use]
    pub const fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Multi-line summary with at most [`MAX_SHOWN_ERRORS`] error messages.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut message = format!(
            "{} {} file(s), {} failed",
            self.operation.past_tense(),
            self.succeeded,
            self.failed()
        );
        if self.declined > 0 {
            message.push_str(&format!(", {} kept existing", self.declined));
        }
        if !self.errors.is_empty() {
            message.push_str("\n\nErrors:");
            for error in self.errors.iter().take(MAX_SHOWN_ERRORS) {
                message.push('\n');
                message.push_str(error);
            }
            if self.errors.len() > MAX_SHOWN_ERRORS {
                message.push_str(&format!(
                    "\n... and {} more error(s)",
                    self.errors.len() - MAX_SHOWN_ERRORS
                ));
            }
        }
        if let Some(error) = &self.rescan_error {
            message.push_str(&format!("\n\nFailed to refresh file list: {error}"));
        }
        message
    }
}

/// Copy or move every changed file into `destination` under its new name.
///
/// Unchanged files are ignored. An existing target asks `prompt` first; a declined
/// prompt skips the file without counting it as an error. A failure on one file
/// does not stop the batch.
pub fn run_batch(
    files: &[FileEntry],
    destination: &Path,
    operation: BatchOperation,
    prompt: &mut dyn OverwritePrompt,
) -> Result<BatchReport, RenameError> {
    if !destination.is_dir() {
        return Err(RenameError::NotADirectory(destination.to_path_buf()));
    }

    let mut report = BatchReport::new(operation);
    for file in files.iter().filter(|file| file.is_changed()) {
        let source = file.path.clone();
        let target = destination.join(&file.new_name);
        match process_file(file, &target, operation, prompt) {
            Ok(()) => {
                report.succeeded += 1;
                report.outcomes.push(FileOutcome::Done { source, target });
            }
            Err(RenameError::UserDeclinedOverwrite(_)) => {
                report.declined += 1;
                report.outcomes.push(FileOutcome::Declined { source, target });
            }
            Err(error) => {
                let error = error.to_string();
                report.errors.push(error.clone());
                report.outcomes.push(FileOutcome::Failed { source, target, error });
            }
        }
    }

    Ok(report)
}

fn process_file(
    file: &FileEntry,
    target: &Path,
    operation: BatchOperation,
    prompt: &mut dyn OverwritePrompt,
) -> Result<(), RenameError> {
    if file.new_name.is_empty() {
        return Err(RenameError::FileOperationFailed {
            file: file.original_name.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "new file name is empty"),
        });
    }
    if target.exists() && !prompt.confirm_overwrite(target) {
        return Err(RenameError::UserDeclinedOverwrite(target.to_path_buf()));
    }

    let result = match operation {
        BatchOperation::Copy => copy_with_metadata(&file.path, target),
        BatchOperation::Move => move_file(&file.path, target),
    };

    result.map_err(|source| RenameError::FileOperationFailed {
        file: file.original_name.clone(),
        source,
    })
}

/// Copy file contents, permissions and timestamps.
pub fn copy_with_metadata(source: &Path, target: &Path) -> io::Result<()> {
    fs::copy(source, target)?;
    let metadata = fs::metadata(source)?;
    let times = FileTimes::new()
        .set_accessed(metadata.accessed()?)
        .set_modified(metadata.modified()?);
    // The copy already has the source permissions and may be read-only
    File::open(target)?.set_times(times)
}

/// Move a file, falling back to copy and delete across file systems.
pub fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Err(error) if error.kind() == io::ErrorKind::CrossesDevices => {
            copy_with_metadata(source, target)?;
            fs::remove_file(source)
        }
        result => result,
    }
}

#[cfg(test)]
mod batch_tests {
    use super::*;

    use std::fs::File;
    use std::io::Write;

    use tempfile::tempdir;

    fn create_file(dir: &Path, name: &str, content: &str) -> FileEntry {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        FileEntry::from_path(path).unwrap()
    }

    fn renamed(mut file: FileEntry, parts: &[&str]) -> FileEntry {
        file.set_parts(parts.iter().map(ToString::to_string).collect());
        file
    }

    #[test]
    fn copy_keeps_source_and_content() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        let file = renamed(create_file(source.path(), "a_b_c.txt", "hello"), &["c", "a"]);

        let report = run_batch(&[file], target.path(), BatchOperation::Copy, &mut FixedAnswer(false)).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 0);
        assert!(source.path().join("a_b_c.txt").exists());
        assert_eq!(fs::read_to_string(target.path().join("c_a.txt")).unwrap(), "hello");
    }

    #[test]
    fn copy_preserves_modified_time() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        let file = renamed(create_file(source.path(), "a_b.txt", "data"), &["b"]);
        let old_time = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options()
            .write(true)
            .open(&file.path)
            .unwrap()
            .set_modified(old_time)
            .unwrap();

        run_batch(&[file], target.path(), BatchOperation::Copy, &mut FixedAnswer(false)).unwrap();

        let copied = fs::metadata(target.path().join("b.txt")).unwrap();
        assert_eq!(copied.modified().unwrap(), old_time);
    }

    #[test]
    fn move_removes_source() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        let files = vec![
            renamed(create_file(source.path(), "a_1.txt", "1"), &["1"]),
            renamed(create_file(source.path(), "b_2.txt", "2"), &["2"]),
        ];

        let report = run_batch(&files, target.path(), BatchOperation::Move, &mut FixedAnswer(false)).unwrap();

        assert_eq!(report.succeeded, 2);
        assert!(!source.path().join("a_1.txt").exists());
        assert!(!source.path().join("b_2.txt").exists());
        assert!(target.path().join("1.txt").exists());
        assert!(target.path().join("2.txt").exists());
    }

    #[test]
    fn unchanged_files_are_ignored() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        let file = create_file(source.path(), "a_b.txt", "x");

        let report = run_batch(&[file], target.path(), BatchOperation::Copy, &mut FixedAnswer(true)).unwrap();

        assert_eq!(report.succeeded, 0);
        assert!(report.outcomes.is_empty());
        assert!(!target.path().join("a_b.txt").exists());
    }

    #[test]
    fn declined_overwrite_is_skipped_not_failed() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::write(target.path().join("b.txt"), "existing").unwrap();
        let file = renamed(create_file(source.path(), "a_b.txt", "new"), &["b"]);

        let mut asked = Vec::new();
        let mut prompt = |path: &Path| {
            asked.push(path.to_path_buf());
            false
        };
        let report = run_batch(&[file], target.path(), BatchOperation::Move, &mut prompt).unwrap();

        assert_eq!(asked, vec![target.path().join("b.txt")]);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.declined, 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(fs::read_to_string(target.path().join("b.txt")).unwrap(), "existing");
        assert!(source.path().join("a_b.txt").exists());
    }

    #[test]
    fn accepted_overwrite_replaces_target() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::write(target.path().join("b.txt"), "existing").unwrap();
        let file = renamed(create_file(source.path(), "a_b.txt", "new"), &["b"]);

        let report = run_batch(&[file], target.path(), BatchOperation::Copy, &mut FixedAnswer(true)).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(fs::read_to_string(target.path().join("b.txt")).unwrap(), "new");
    }

    #[test]
    fn failures_are_collected_and_batch_continues() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        let mut files = Vec::new();
        for index in 0..7 {
            let mut file = create_file(source.path(), &format!("gone_{index}.txt"), "");
            fs::remove_file(&file.path).unwrap();
            file.set_parts(vec![format!("missing{index}")]);
            files.push(file);
        }
        files.push(renamed(create_file(source.path(), "ok_file.txt", "ok"), &["ok"]));

        let report = run_batch(&files, target.path(), BatchOperation::Copy, &mut FixedAnswer(true)).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 7);
        assert!(target.path().join("ok.txt").exists());

        let summary = report.summary();
        assert!(summary.starts_with("Copied 1 file(s), 7 failed"));
        assert_eq!(summary.matches("gone_").count(), MAX_SHOWN_ERRORS);
        assert!(summary.ends_with("... and 2 more error(s)"));
    }

    #[test]
    fn missing_destination_is_rejected() {
        let source = tempdir().unwrap();
        let file = renamed(create_file(source.path(), "a_b.txt", ""), &["a"]);
        let result = run_batch(
            &[file],
            &source.path().join("missing"),
            BatchOperation::Copy,
            &mut FixedAnswer(true),
        );
        assert!(matches!(result, Err(RenameError::NotADirectory(_))));
        assert!(source.path().join("a_b.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_of_read_only_file_succeeds() {
        use std::os::unix::fs::PermissionsExt;

        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        let file = renamed(create_file(source.path(), "a_b.txt", "locked"), &["b"]);
        let old_time = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options()
            .write(true)
            .open(&file.path)
            .unwrap()
            .set_modified(old_time)
            .unwrap();
        fs::set_permissions(&file.path, fs::Permissions::from_mode(0o444)).unwrap();

        let report = run_batch(&[file], target.path(), BatchOperation::Copy, &mut FixedAnswer(false)).unwrap();

        assert_eq!(report.succeeded, 1);
        assert!(report.errors.is_empty());
        let copied = fs::metadata(target.path().join("b.txt")).unwrap();
        assert_eq!(copied.permissions().mode() & 0o777, 0o444);
        assert_eq!(copied.modified().unwrap(), old_time);
    }

    #[test]
    fn empty_new_name_fails_without_prompt() {
        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        let file = renamed(create_file(source.path(), "a_b", "x"), &[]);
        assert_eq!(file.new_name, "");

        let mut asked = Vec::new();
        let mut prompt = |path: &Path| {
            asked.push(path.to_path_buf());
            true
        };
        let report = run_batch(&[file], target.path(), BatchOperation::Move, &mut prompt).unwrap();

        assert!(asked.is_empty());
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.declined, 0);
        assert_eq!(report.failed(), 1);
        assert!(report.errors[0].contains("new file name is empty"));
        assert!(source.path().join("a_b").exists());
    }

    #[test]
    fn summary_mentions_declined() {
        let report = BatchReport {
            operation: BatchOperation::Move,
            succeeded: 2,
            declined: 1,
            errors: Vec::new(),
            outcomes: Vec::new(),
            rescan_error: None,
        };
        assert_eq!(report.summary(), "Moved 2 file(s), 0 failed, 1 kept existing");
    }
}
