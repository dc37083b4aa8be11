//! Meter group management: reconciles meter ids picked by hand, uploaded in
//! files and already held by a group, and stores the resulting groups.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infra;
pub mod usecase;

pub use domain::entities::meter::{CellValue, MeterId, MeterSet, ParsedRow};
pub use domain::reconcile::{
    find_meter_id_column, validate_and_extract_meter_ids, FormMode, MeterSelection, ParseError,
    ParseResult, SelectionView,
};
pub use usecase::services::selection_service::SelectionSession;
