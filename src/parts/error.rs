use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from scanning, rule replay and batch file operations.
///
/// Every variant is scoped to one directory or one file.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The directory could not be listed. No partial file list is kept.
    #[error("Failed to read directory {}: {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The given path exists but is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// No scanned file has the given name.
    #[error("File not found in directory: {0}")]
    FileNotFound(String),

    /// A rule refers to a part the target file does not have.
    #[error("Part index {index} is out of range for {file} ({count} parts)")]
    PartIndexOutOfRange { file: String, index: usize, count: usize },

    /// Copying or moving a single file failed.
    #[error("{file}: {source}")]
    FileOperationFailed {
        file: String,
        #[source]
        source: io::Error,
    },

    /// The user chose to keep an existing destination file.
    #[error("Kept existing file {}", .0.display())]
    UserDeclinedOverwrite(PathBuf),
}
