use tracing::{debug, warn};

use crate::domain::entities::meter::{join_meter_ids, MeterId, MeterSet, ParsedRow};
use crate::domain::reconcile::{
    validate_and_extract_meter_ids, MeterSelection, ParseError, ParseResult, SelectionView,
};
use crate::usecase::ports::form::{DropdownInput, MeterIdField, Notifier};

/// One create or edit form session: owns the meter sources and keeps the
/// form's meter id field in step with them after every event.
pub struct SelectionSession<F, N> {
    selection: MeterSelection,
    field: F,
    notifier: N,
}

impl<F, N> SelectionSession<F, N>
where
    F: MeterIdField,
    N: Notifier,
{
    pub fn new(selection: MeterSelection, field: F, notifier: N) -> Self {
        let mut session = Self {
            selection,
            field,
            notifier,
        };
        session.sync_field();
        session
    }

    pub fn selection(&self) -> &MeterSelection {
        &self.selection
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn view(&self) -> SelectionView {
        self.selection.view()
    }

    pub fn into_parts(self) -> (MeterSelection, F, N) {
        (self.selection, self.field, self.notifier)
    }

    /// Handles a parsed upload. Accepted ids are added to earlier uploads;
    /// duplicates only produce a warning and never hold back the valid ids.
    pub fn on_file_parse(&mut self, rows: &[ParsedRow]) -> ParseResult {
        let headers = rows.first().map(ParsedRow::headers).unwrap_or_default();
        let result = validate_and_extract_meter_ids(&headers, rows, Some(self.selection.existing()));

        if let Some(err) = &result.error {
            warn!(rows = rows.len(), duplicates = result.duplicates.len(), "upload rejected: {err}");
            self.notifier.on_error(&err.to_string());
            return result;
        }

        if let Some(message) = result.duplicate_warning() {
            self.notifier.on_warning(&message);
        }

        let ids = result.ids();
        self.selection.merge_file_ids(ids.iter().copied());
        self.sync_field();
        debug!(
            accepted = ids.len(),
            duplicates = result.duplicates.len(),
            file_total = self.selection.file_uploaded().len(),
            "upload merged"
        );
        self.notifier.on_success(&ids);
        result
    }

    /// Reports a file that could not be read into rows. Selection is untouched.
    pub fn on_file_load_failed(&mut self, err: &anyhow::Error) -> ParseResult {
        let error = ParseError::Processing(format!("{err:#}"));
        warn!("upload could not be read: {err:#}");
        self.notifier.on_error(&error.to_string());
        ParseResult::failure(error)
    }

    pub fn on_file_remove(&mut self) {
        debug!(
            cleared = self.selection.file_uploaded().len(),
            "uploaded file removed"
        );
        self.selection.clear_file_ids();
        self.sync_field();
    }

    /// Handles a multi-select change. Ids already supplied by an upload or by
    /// the group itself are dropped with a warning; the rest become the new
    /// dropdown selection.
    pub fn on_dropdown_change(&mut self, input: impl Into<DropdownInput>) {
        let mut requested = MeterSet::new();
        for option in input.into().into_options() {
            match option.value.parse::<MeterId>() {
                Ok(id) => {
                    requested.insert(id);
                }
                Err(err) => warn!(label = %option.label, "ignoring option: {err}"),
            }
        }

        let (duplicates, unique): (MeterSet, MeterSet) = requested.into_iter().partition(|id| {
            self.selection.file_uploaded().contains(id) || self.selection.existing().contains(id)
        });

        if !duplicates.is_empty() {
            self.notifier.on_warning(&format!(
                "{} meter ID(s) already selected: {}",
                duplicates.len(),
                join_meter_ids(&duplicates)
            ));
        }

        debug!(
            selected = unique.len(),
            dropped = duplicates.len(),
            "dropdown selection replaced"
        );
        self.selection.replace_dropdown_ids(unique);
        self.sync_field();
    }

    fn sync_field(&mut self) {
        let view = self.selection.view();
        self.field.set_meter_ids(view.submitted_ids());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::ports::form::{FieldValue, RecordingNotifier, SelectOption};

    fn id(value: u64) -> MeterId {
        MeterId::new(value).expect("test ids are positive")
    }

    fn ids(values: &[u64]) -> MeterSet {
        values.iter().map(|v| id(*v)).collect()
    }

    fn upload(values: &[&str]) -> Vec<ParsedRow> {
        values
            .iter()
            .map(|value| ParsedRow::new().with("meter_id", *value).with("site", "north"))
            .collect()
    }

    fn session(selection: MeterSelection) -> SelectionSession<FieldValue, RecordingNotifier> {
        SelectionSession::new(selection, FieldValue::default(), RecordingNotifier::default())
    }

    #[test]
    fn partial_duplicates_still_add_valid_ids() {
        let mut session = session(MeterSelection::edit(ids(&[1])));

        let result = session.on_file_parse(&upload(&["1", "2", "3", "3", "4"]));

        assert!(result.success());
        assert_eq!(session.selection().file_uploaded(), &ids(&[2, 3, 4]));
        assert_eq!(session.notifier().warnings().len(), 1);
        assert_eq!(session.notifier().successes(), vec![&[id(2), id(3), id(4)][..]]);
        assert_eq!(session.view().total_selected, 4);
        assert_eq!(session.field().meter_ids, vec![id(2), id(3), id(4)]);
    }

    #[test]
    fn repeated_uploads_accumulate() {
        let mut session = session(MeterSelection::create());

        session.on_file_parse(&upload(&["10", "11"]));
        session.on_file_parse(&upload(&["12"]));

        assert_eq!(session.selection().file_uploaded(), &ids(&[10, 11, 12]));
        assert_eq!(session.field().meter_ids, vec![id(10), id(11), id(12)]);
    }

    #[test]
    fn failed_upload_keeps_previous_ids() {
        let mut session = session(MeterSelection::create());
        session.on_file_parse(&upload(&["10"]));

        let bad = vec![ParsedRow::new().with("serial", "11")];
        let result = session.on_file_parse(&bad);

        assert!(!result.success());
        assert_eq!(session.selection().file_uploaded(), &ids(&[10]));
        assert_eq!(session.notifier().errors().len(), 1);
        assert!(session.notifier().errors()[0].starts_with("Invalid file format"));
    }

    #[test]
    fn load_failure_is_reported_as_processing_error() {
        let mut session = session(MeterSelection::create());

        let result = session.on_file_load_failed(&anyhow::anyhow!("truncated workbook"));

        assert!(!result.success());
        assert_eq!(
            session.notifier().errors(),
            vec!["Failed to process file data: truncated workbook"]
        );
    }

    #[test]
    fn dropdown_drops_ids_already_uploaded() {
        let mut session = session(MeterSelection::create());
        session.on_file_parse(&upload(&["5", "6"]));

        session.on_dropdown_change(DropdownInput::Many(vec![
            SelectOption::new("6"),
            SelectOption::new("7"),
        ]));

        assert_eq!(session.selection().dropdown_selected(), &ids(&[7]));
        assert_eq!(session.view().displayed_ids, ids(&[5, 6, 7]));
        assert_eq!(session.notifier().warnings(), vec!["1 meter ID(s) already selected: 6"]);
    }

    #[test]
    fn dropdown_accepts_single_and_cleared_inputs() {
        let mut session = session(MeterSelection::edit(ids(&[1])));

        session.on_dropdown_change(DropdownInput::Single(SelectOption::new("1")));
        assert!(session.selection().dropdown_selected().is_empty());
        assert_eq!(session.notifier().warnings().len(), 1);

        session.on_dropdown_change(DropdownInput::Single(SelectOption::new("2")));
        assert_eq!(session.field().meter_ids, vec![id(2)]);

        session.on_dropdown_change(None::<Vec<SelectOption>>);
        assert!(session.selection().dropdown_selected().is_empty());
        assert!(session.field().meter_ids.is_empty());
    }

    #[test]
    fn same_inputs_write_the_same_field_value() {
        let mut session = session(MeterSelection::edit(ids(&[1])));
        assert_eq!(session.field().writes, 1);

        session.on_dropdown_change(DropdownInput::Single(SelectOption::new("2")));
        let first = session.field().meter_ids.clone();
        session.on_dropdown_change(DropdownInput::Single(SelectOption::new("2")));

        assert_eq!(session.field().writes, 3);
        assert_eq!(session.field().meter_ids, first);
    }

    #[test]
    fn removing_the_file_clears_upload_ids_only() {
        let mut session = session(MeterSelection::create());
        session.on_file_parse(&upload(&["1"]));
        session.on_dropdown_change(DropdownInput::Single(SelectOption::new("2")));

        session.on_file_remove();

        assert!(session.selection().file_uploaded().is_empty());
        assert_eq!(session.field().meter_ids, vec![id(2)]);
    }
}
