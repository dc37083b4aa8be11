//! Merging meter ids from group membership, dropdown picks and file uploads.

pub mod extract;
pub mod header;
pub mod selection;

pub use extract::{validate_and_extract_meter_ids, ParseError, ParseResult, ParsedMeter};
pub use header::{find_meter_id_column, METER_ID_HEADERS};
pub use selection::{FormMode, MeterSelection, SelectionView};
