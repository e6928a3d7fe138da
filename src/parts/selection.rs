//! Interactive part selection for a single file.

use crate::parts::{FileEntry, build_name};

/// Editor state for one file: which original parts are kept and which custom parts are added.
///
/// Selected positions are kept as an ordered set, so enabling a part always lands it
/// between its lower and higher neighbours no matter in which order parts were toggled.
/// Custom parts always come after the selected parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSelection {
    parts: Vec<String>,
    extension: String,
    selected: Vec<usize>,
    custom: Vec<String>,
}

impl PartSelection {
    /// Start editing the given file.
    ///
    /// An unedited file starts with every part selected.
    /// An edited file restores the selection that produced its current name.
    #[must_use]
    pub fn new(file: &FileEntry) -> Self {
        let parts = file.original_parts();
        let (selected, custom) = restore_selection(&parts, &file.name_parts);
        Self {
            selected,
            custom,
            extension: file.extension.clone(),
            parts,
        }
    }

    /// Original parts of the file.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Selected positions in ascending order.
    #[must_use]
    pub fn selected_indices(&self) -> &[usize] {
        &self.selected
    }

    #[must_use]
    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.binary_search(&index).is_ok()
    }

    /// Flip the selection state of a part. Returns the new state.
    ///
    /// Out of range positions are ignored.
    pub fn toggle(&mut self, index: usize) -> bool {
        if index >= self.parts.len() {
            return false;
        }
        match self.selected.binary_search(&index) {
            Ok(position) => {
                self.selected.remove(position);
                false
            }
            Err(position) => {
                self.selected.insert(position, index);
                true
            }
        }
    }

    /// Select every part and drop custom parts.
    pub fn select_all(&mut self) {
        self.selected = (0..self.parts.len()).collect();
        self.custom.clear();
    }

    /// Append a custom part. Blank text is ignored.
    pub fn add_custom(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.custom.push(text.to_string());
        true
    }

    /// Remove the custom part at the given position.
    pub fn remove_custom(&mut self, position: usize) -> Option<String> {
        (position < self.custom.len()).then(|| self.custom.remove(position))
    }

    /// Remove the most recently added custom part.
    pub fn pop_custom(&mut self) -> Option<String> {
        self.custom.pop()
    }

    /// Parts in output order: selected parts by position, then custom parts.
    #[must_use]
    pub fn selected_parts(&self) -> Vec<String> {
        self.selected
            .iter()
            .map(|&index| self.parts[index].clone())
            .chain(self.custom.iter().cloned())
            .collect()
    }

    /// New file name for the current selection.
    #[must_use]
    pub fn preview(&self) -> String {
        build_name(&self.selected_parts(), &self.extension)
    }

    /// Write the selection into the file.
    pub fn commit(&self, file: &mut FileEntry) {
        file.set_parts(self.selected_parts());
    }
}

/// Split the current parts into ascending original positions followed by custom parts.
///
/// The longest leading run that matches original parts at increasing positions becomes
/// the selection and the rest stays custom, so the result always rebuilds `current` exactly.
fn restore_selection(original: &[String], current: &[String]) -> (Vec<usize>, Vec<String>) {
    let mut selected = Vec::with_capacity(current.len());
    let mut next = 0;
    for part in current {
        let Some(offset) = original[next..].iter().position(|candidate| candidate == part) else {
            break;
        };
        selected.push(next + offset);
        next += offset + 1;
    }
    let custom = current[selected.len()..].to_vec();
    (selected, custom)
}
