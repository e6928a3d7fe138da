//! Underscore part renaming.
//!
//! A file name stem is split on `_` into parts. The user keeps, drops and adds parts
//! for one file, the chosen positions and custom parts are generalized into a [`Rule`],
//! and the rule is replayed over the other files before copying or moving them.

pub mod batch;
mod entry;
mod error;
mod rule;
mod selection;
mod session;

pub use batch::{
    BatchOperation, BatchReport, FileOutcome, FixedAnswer, MAX_SHOWN_ERRORS, OverwritePrompt, run_batch,
};
pub use entry::{FileEntry, NameFilter, PART_SEPARATOR, build_name, example_parts, scan_directory, split_stem};
pub use error::RenameError;
pub use rule::{ReplayReport, Rule};
pub use selection::PartSelection;
pub use session::Session;
