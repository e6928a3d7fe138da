//! Deriving a reusable renaming rule from one edited file and replaying it over others.

use itertools::Itertools;

use crate::parts::{FileEntry, RenameError, example_parts, split_stem};

/// Which original parts to keep, by position, and which literal parts to append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    /// Strictly increasing positions into the original parts.
    indices: Vec<usize>,
    /// Custom parts appended after the indexed parts.
    literals: Vec<String>,
    /// Template tokens that occur more than once among the original parts.
    ambiguous: Vec<String>,
}

/// Result of replaying a rule over a file list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub skipped: usize,
    /// Errors for the skipped files, in list order.
    pub skipped_files: Vec<String>,
}

impl Rule {
    /// Create a rule from explicit positions and literal parts.
    ///
    /// Positions are sorted and de-duplicated since replay always emits them in ascending order.
    #[must_use]
    pub fn new(indices: impl IntoIterator<Item = usize>, literals: Vec<String>) -> Self {
        Self {
            indices: indices.into_iter().sorted_unstable().dedup().collect(),
            literals,
            ambiguous: Vec::new(),
        }
    }

    /// Infer the rule that turns `original_parts` into `current_parts`.
    ///
    /// A current part that equals an original part is recorded as that part's index,
    /// anything else is a literal. Each original position is matched at most once,
    /// taking the first unused position with the same text, so repeated tokens map to
    /// successive positions instead of all pointing at the first one.
    #[must_use]
    pub fn derive(original_parts: &[String], current_parts: &[String]) -> Self {
        let mut used = vec![false; original_parts.len()];
        let mut indices = Vec::new();
        let mut literals = Vec::new();

        for part in current_parts {
            let position = original_parts
                .iter()
                .enumerate()
                .position(|(index, original)| !used[index] && original == part);

            if let Some(index) = position {
                used[index] = true;
                indices.push(index);
            } else {
                literals.push(part.clone());
            }
        }

        let ambiguous = indices
            .iter()
            .map(|&index| &original_parts[index])
            .filter(|token| original_parts.iter().filter(|original| original == token).count() > 1)
            .unique()
            .cloned()
            .collect();

        Self {
            ambiguous,
            ..Self::new(indices, literals)
        }
    }

    /// Derive the rule from an edited template file.
    #[must_use]
    pub fn from_template(template: &FileEntry) -> Self {
        Self::derive(&template.original_parts(), &template.name_parts)
    }

    /// Derive the rule from an example rename, given as stems without extension.
    ///
    /// ```rust
    /// use part_rename::Rule;
    ///
    /// let rule = Rule::from_example("a_b_c", "a_c_X");
    /// assert_eq!(rule.indices(), &[0, 2]);
    /// assert_eq!(rule.literals(), &["X".to_string()]);
    /// ```
    #[must_use]
    pub fn from_example(original_stem: &str, new_stem: &str) -> Self {
        Self::derive(&split_stem(original_stem), &example_parts(new_stem))
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[must_use]
    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    #[must_use]
    pub fn ambiguous(&self) -> &[String] {
        &self.ambiguous
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.literals.is_empty()
    }

    /// Build new parts from the given original parts.
    ///
    /// Returns the first index that does not exist in `parts` as the error.
    pub fn build_parts(&self, parts: &[String]) -> Result<Vec<String>, usize> {
        let mut new_parts = Vec::with_capacity(self.indices.len() + self.literals.len());
        for &index in &self.indices {
            new_parts.push(parts.get(index).ok_or(index)?.clone());
        }
        new_parts.extend(self.literals.iter().cloned());
        Ok(new_parts)
    }

    /// Apply the rule to one file, starting from its original parts.
    ///
    /// The file is left untouched when an index is out of range.
    pub fn apply(&self, file: &mut FileEntry) -> Result<(), RenameError> {
        let original_parts = file.original_parts();
        let new_parts = self
            .build_parts(&original_parts)
            .map_err(|index| RenameError::PartIndexOutOfRange {
                file: file.original_name.clone(),
                index,
                count: original_parts.len(),
            })?;
        file.set_parts(new_parts);
        Ok(())
    }

    /// Apply the rule to every file except the one at `skip_index`.
    ///
    /// Files with too few parts are skipped and counted, the rest are renamed.
    pub fn apply_to_all(&self, files: &mut [FileEntry], skip_index: Option<usize>) -> ReplayReport {
        let mut report = ReplayReport::default();
        for (index, file) in files.iter_mut().enumerate() {
            if Some(index) == skip_index {
                continue;
            }
            match self.apply(file) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    report.skipped += 1;
                    report.skipped_files.push(error.to_string());
                }
            }
        }
        report
    }

    /// Human-readable summary of the rule for a confirmation prompt.
    #[must_use]
    pub fn describe(&self, template_parts: &[String]) -> String {
        let selected: Vec<&str> = self
            .indices
            .iter()
            .filter_map(|&index| template_parts.get(index).map(String::as_str))
            .collect();

        let mut description = if selected.is_empty() {
            "No original parts".to_string()
        } else {
            format!(
                "Original parts: {} (positions {})",
                selected.join(", "),
                self.indices.iter().map(|index| index + 1).join(", ")
            )
        };
        if !self.literals.is_empty() {
            description.push_str(&format!("\nCustom parts: {}", self.literals.join(", ")));
        }
        if !self.ambiguous.is_empty() {
            description.push_str(&format!(
                "\nWarning: repeated parts matched by order of appearance: {}",
                self.ambiguous.join(", ")
            ));
        }
        description
    }
}

impl ReplayReport {
    /// One-line result summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut message = format!("Applied to {} file(s)", self.applied);
        if self.skipped > 0 {
            message.push_str(&format!(", skipped {} (not enough name parts)", self.skipped));
        }
        message
    }
}

#[cfg(test)]
mod rule_tests {
    use super::*;

    use std::path::PathBuf;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn entry(name: &str) -> FileEntry {
        FileEntry::from_path(PathBuf::from("/data").join(name)).unwrap()
    }

    fn edited(name: &str, parts: &[&str]) -> FileEntry {
        let mut file = entry(name);
        file.set_parts(strings(parts));
        file
    }

    #[test]
    fn derive_partitions_indices_and_literals() {
        let template = edited("a_b_c.txt", &["a", "c", "X"]);
        let rule = Rule::from_template(&template);
        assert_eq!(rule.indices(), &[0, 2]);
        assert_eq!(rule.literals(), &strings(&["X"]));
        assert!(rule.ambiguous().is_empty());
    }

    #[test]
    fn target_with_too_few_parts_is_skipped() {
        let rule = Rule::from_template(&edited("a_b_c.txt", &["a", "c", "X"]));
        let mut target = entry("p_q.txt");
        let result = rule.apply(&mut target);
        assert!(matches!(
            result,
            Err(RenameError::PartIndexOutOfRange { index: 2, count: 2, .. })
        ));
        assert_eq!(target.new_name, "p_q.txt");
        assert!(!target.is_changed());
    }

    #[test]
    fn target_with_enough_parts_is_renamed() {
        let rule = Rule::from_template(&edited("a_b_c.txt", &["a", "c", "X"]));
        let mut target = entry("p_q_r.txt");
        rule.apply(&mut target).unwrap();
        assert_eq!(target.new_name, "p_r_X.txt");
        assert_eq!(target.name_parts, strings(&["p", "r", "X"]));
    }

    #[test]
    fn target_keeps_own_extension() {
        let rule = Rule::from_template(&edited("a_b_c.txt", &["c"]));
        let mut target = entry("p_q_r_s.jpg");
        rule.apply(&mut target).unwrap();
        assert_eq!(target.new_name, "r.jpg");
    }

    #[test]
    fn apply_to_all_skips_template_and_counts() {
        let mut files = vec![
            entry("p_q.txt"),
            edited("a_b_c.txt", &["a", "c", "X"]),
            entry("p_q_r.txt"),
            entry("one_two_three_four.txt"),
        ];
        let rule = Rule::from_template(&files[1]);
        let report = rule.apply_to_all(&mut files, Some(1));

        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.skipped_files.len(), 1);
        assert!(report.skipped_files[0].contains("p_q.txt"));
        assert_eq!(files[1].new_name, "a_c_X.txt");
        assert_eq!(files[2].new_name, "p_r_X.txt");
        assert_eq!(files[3].new_name, "one_three_X.txt");
    }

    #[test]
    fn replay_is_idempotent() {
        let rule = Rule::from_template(&edited("a_b_c.txt", &["b", "Y"]));
        let mut files = vec![entry("x_y_z.txt"), entry("1_2.txt"), entry("only.txt")];
        rule.apply_to_all(&mut files, None);
        let first: Vec<String> = files.iter().map(|f| f.new_name.clone()).collect();
        rule.apply_to_all(&mut files, None);
        let second: Vec<String> = files.iter().map(|f| f.new_name.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["y_Y.txt", "2_Y.txt", "only.txt"]);
    }

    #[test]
    fn replay_emits_indices_before_literals() {
        let rule = Rule::from_template(&edited("a_b_c.txt", &["X", "c", "a"]));
        assert_eq!(rule.indices(), &[0, 2]);
        let mut target = entry("p_q_r.txt");
        rule.apply(&mut target).unwrap();
        assert_eq!(target.new_name, "p_r_X.txt");
    }

    #[test]
    fn repeated_token_maps_to_successive_positions() {
        let rule = Rule::derive(&strings(&["x", "a", "x"]), &strings(&["x", "x"]));
        assert_eq!(rule.indices(), &[0, 2]);
        assert!(rule.literals().is_empty());
        assert_eq!(rule.ambiguous(), &strings(&["x"]));
    }

    #[test]
    fn repeated_token_beyond_originals_is_literal() {
        let rule = Rule::derive(&strings(&["a", "b"]), &strings(&["a", "a"]));
        assert_eq!(rule.indices(), &[0]);
        assert_eq!(rule.literals(), &strings(&["a"]));
        assert!(rule.ambiguous().is_empty());
    }

    #[test]
    fn empty_template_parts_give_empty_rule() {
        let rule = Rule::from_template(&edited("a_b.txt", &[]));
        assert!(rule.is_empty());
        let mut target = entry("p_q.txt");
        rule.apply(&mut target).unwrap();
        assert_eq!(target.new_name, ".txt");
    }

    #[test]
    fn new_sorts_and_deduplicates_indices() {
        let rule = Rule::new([3, 1, 3, 0], strings(&["end"]));
        assert_eq!(rule.indices(), &[0, 1, 3]);
        assert_eq!(rule.build_parts(&strings(&["a", "b", "c", "d"])).unwrap(), strings(&["a", "b", "d", "end"]));
        assert_eq!(rule.build_parts(&strings(&["a", "b"])), Err(3));
    }

    #[test]
    fn from_example_splits_stems() {
        let rule = Rule::from_example("IMG_2024_0101_beach", "2024_beach_holiday");
        assert_eq!(rule.indices(), &[1, 3]);
        assert_eq!(rule.literals(), &strings(&["holiday"]));
    }

    #[test]
    fn from_example_with_empty_new_stem() {
        let rule = Rule::from_example("a_b", "");
        assert!(rule.is_empty());
    }

    #[test]
    fn describe_lists_parts_and_warnings() {
        let parts = strings(&["x", "a", "x"]);
        let rule = Rule::derive(&parts, &strings(&["x", "a", "NEW"]));
        let description = rule.describe(&parts);
        assert!(description.contains("Original parts: x, a (positions 1, 2)"));
        assert!(description.contains("Custom parts: NEW"));
        assert!(description.contains("Warning"));

        let literal_only = Rule::new([], strings(&["Z"]));
        assert!(literal_only.describe(&parts).starts_with("No original parts"));
    }

    #[test]
    fn replay_report_summary() {
        let report = ReplayReport {
            applied: 3,
            skipped: 1,
            skipped_files: Vec::new(),
        };
        assert_eq!(report.summary(), "Applied to 3 file(s), skipped 1 (not enough name parts)");
    }
}
