use crate::domain::entities::meter::{MeterId, MeterSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// The three meter sources of one form session.
///
/// `existing` is captured when the session opens and never changes after
/// that; only the file and dropdown sets move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterSelection {
    mode: FormMode,
    existing: MeterSet,
    file_uploaded: MeterSet,
    dropdown_selected: MeterSet,
}

impl MeterSelection {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            existing: MeterSet::new(),
            file_uploaded: MeterSet::new(),
            dropdown_selected: MeterSet::new(),
        }
    }

    pub fn edit(existing: MeterSet) -> Self {
        Self {
            mode: FormMode::Edit,
            existing,
            file_uploaded: MeterSet::new(),
            dropdown_selected: MeterSet::new(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn existing(&self) -> &MeterSet {
        &self.existing
    }

    pub fn file_uploaded(&self) -> &MeterSet {
        &self.file_uploaded
    }

    pub fn dropdown_selected(&self) -> &MeterSet {
        &self.dropdown_selected
    }

    /// Adds accepted upload ids. Uploads accumulate across files.
    pub fn merge_file_ids(&mut self, ids: impl IntoIterator<Item = MeterId>) {
        self.file_uploaded.extend(ids);
    }

    pub fn clear_file_ids(&mut self) {
        self.file_uploaded.clear();
    }

    /// Replaces the dropdown selection; the control always reports its full value.
    pub fn replace_dropdown_ids(&mut self, ids: MeterSet) {
        self.dropdown_selected = ids;
    }

    pub fn view(&self) -> SelectionView {
        let candidates: MeterSet = self
            .file_uploaded
            .union(&self.dropdown_selected)
            .copied()
            .collect();

        let (new_ids, total_selected) = match self.mode {
            FormMode::Edit => {
                let new_ids: MeterSet = candidates.difference(&self.existing).copied().collect();
                let total = self.existing.len() + new_ids.len();
                (new_ids, total)
            }
            FormMode::Create => (candidates.clone(), candidates.len()),
        };

        SelectionView {
            mode: self.mode,
            displayed_ids: candidates,
            new_ids,
            total_selected,
            existing_count: self.existing.len(),
            file_count: self.file_uploaded.len(),
            dropdown_count: self.dropdown_selected.len(),
        }
    }
}

/// Derived, read-only picture of a [`MeterSelection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionView {
    pub mode: FormMode,
    pub displayed_ids: MeterSet,
    pub new_ids: MeterSet,
    pub total_selected: usize,
    pub existing_count: usize,
    pub file_count: usize,
    pub dropdown_count: usize,
}

impl SelectionView {
    /// Value written into the form's meter id field.
    pub fn submitted_ids(&self) -> Vec<MeterId> {
        self.new_ids.iter().copied().collect()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        if self.total_selected == 0 {
            return vec!["No meters selected".to_string()];
        }

        let mut lines = Vec::new();
        match self.mode {
            FormMode::Edit => {
                lines.push(format!("Total meters: {}", self.total_selected));
                if self.existing_count > 0 {
                    lines.push(format!("Existing meters: {}", self.existing_count));
                }
                if !self.new_ids.is_empty() {
                    let mut sources = Vec::new();
                    if self.file_count > 0 {
                        sources.push(format!("{} from file", self.file_count));
                    }
                    if self.dropdown_count > 0 {
                        sources.push(format!("{} from selection", self.dropdown_count));
                    }
                    let mut line = format!("New meters to add: {}", self.new_ids.len());
                    if !sources.is_empty() {
                        line.push_str(&format!(" ({})", sources.join(", ")));
                    }
                    lines.push(line);
                }
            }
            FormMode::Create => {
                lines.push(format!("Total meters selected: {}", self.total_selected));
                if self.file_count > 0 {
                    lines.push(format!("From file upload: {}", self.file_count));
                }
                if self.dropdown_count > 0 {
                    lines.push(format!("From manual selection: {}", self.dropdown_count));
                }
            }
        }
        lines
    }
}
