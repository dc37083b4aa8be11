use crate::domain::entities::meter::MeterId;

/// The form field that carries the meter ids sent on submit.
pub trait MeterIdField {
    fn set_meter_ids(&mut self, ids: Vec<MeterId>);
}

/// User-facing feedback sink for upload and selection events.
pub trait Notifier {
    fn on_success(&mut self, ids: &[MeterId]);
    fn on_warning(&mut self, message: &str);
    fn on_error(&mut self, message: &str);
}

/// One entry of the meter multi-select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

impl From<MeterId> for SelectOption {
    fn from(id: MeterId) -> Self {
        SelectOption::new(id.to_string())
    }
}

/// What the multi-select hands back on change: nothing, one option or many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropdownInput {
    Cleared,
    Single(SelectOption),
    Many(Vec<SelectOption>),
}

impl DropdownInput {
    pub fn into_options(self) -> Vec<SelectOption> {
        match self {
            DropdownInput::Cleared => Vec::new(),
            DropdownInput::Single(option) => vec![option],
            DropdownInput::Many(options) => options,
        }
    }
}

impl From<Option<Vec<SelectOption>>> for DropdownInput {
    fn from(value: Option<Vec<SelectOption>>) -> Self {
        match value {
            Some(options) => DropdownInput::Many(options),
            None => DropdownInput::Cleared,
        }
    }
}

/// In-memory field, used by the CLI and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue {
    pub meter_ids: Vec<MeterId>,
    pub writes: usize,
}

impl MeterIdField for FieldValue {
    fn set_meter_ids(&mut self, ids: Vec<MeterId>) {
        self.meter_ids = ids;
        self.writes += 1;
    }
}

/// Event recorded by [`RecordingNotifier`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(Vec<MeterId>),
    Warning(String),
    Error(String),
}

/// Notifier that keeps every event for assertions.
#[cfg(test)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingNotifier {
    pub notices: Vec<Notice>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn warnings(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|notice| match notice {
                Notice::Warning(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|notice| match notice {
                Notice::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<&[MeterId]> {
        self.notices
            .iter()
            .filter_map(|notice| match notice {
                Notice::Success(ids) => Some(ids.as_slice()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn on_success(&mut self, ids: &[MeterId]) {
        self.notices.push(Notice::Success(ids.to_vec()));
    }

    fn on_warning(&mut self, message: &str) {
        self.notices.push(Notice::Warning(message.to_string()));
    }

    fn on_error(&mut self, message: &str) {
        self.notices.push(Notice::Error(message.to_string()));
    }
}
