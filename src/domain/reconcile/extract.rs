use std::collections::HashSet;

use thiserror::Error;

use crate::domain::entities::meter::{join_meter_ids, MeterId, MeterSet, ParsedRow};
use crate::domain::reconcile::header::{accepted_headers_label, find_meter_id_column};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedMeter {
    pub id: MeterId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid file format. Header must contain one of: {accepted}")]
    Format { accepted: String },
    #[error("All meter IDs in the file already exist ({count} duplicate(s) skipped)")]
    AllDuplicates { count: usize },
    #[error("No valid meter IDs found in the file")]
    NoValidIds,
    #[error("Failed to process file data: {0}")]
    Processing(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub data: Vec<ParsedMeter>,
    pub duplicates: Vec<MeterId>,
    pub error: Option<ParseError>,
}

impl ParseResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn failure(error: ParseError) -> Self {
        Self {
            data: Vec::new(),
            duplicates: Vec::new(),
            error: Some(error),
        }
    }

    pub fn ids(&self) -> Vec<MeterId> {
        self.data.iter().map(|meter| meter.id).collect()
    }

    /// Message shown next to accepted ids when some rows were duplicates.
    pub fn duplicate_warning(&self) -> Option<String> {
        if self.duplicates.is_empty() {
            return None;
        }
        Some(format!(
            "{} duplicate meter ID(s) skipped: {}",
            self.duplicates.len(),
            join_meter_ids(&self.duplicates)
        ))
    }
}

/// Pulls unique meter ids out of parsed upload rows.
///
/// Blank cells and values that are not positive whole numbers are skipped
/// without comment. A finite positive fraction such as `2.5` is dropped here
/// too, even though a plain finite-and-positive check would let it through.
/// Ids found in `existing`, or repeated within the rows,
/// are reported in `duplicates` (once each) and kept out of `data`.
pub fn validate_and_extract_meter_ids<S: AsRef<str>>(
    headers: &[S],
    rows: &[ParsedRow],
    existing: Option<&MeterSet>,
) -> ParseResult {
    let Some(column) = find_meter_id_column(headers) else {
        return ParseResult::failure(ParseError::Format {
            accepted: accepted_headers_label(),
        });
    };

    let mut data = Vec::new();
    let mut duplicates = Vec::new();
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();

    for row in rows {
        let Some(cell) = row.get(column) else {
            continue;
        };
        if cell.is_blank() {
            continue;
        }
        let Some(id) = MeterId::from_number(cell.to_number()) else {
            continue;
        };

        let already_present = existing.is_some_and(|ids| ids.contains(&id));
        if already_present || !seen.insert(id) {
            if reported.insert(id) {
                duplicates.push(id);
            }
            continue;
        }
        data.push(ParsedMeter { id });
    }

    if data.is_empty() {
        let error = if duplicates.is_empty() {
            ParseError::NoValidIds
        } else {
            ParseError::AllDuplicates {
                count: duplicates.len(),
            }
        };
        return ParseResult {
            data,
            duplicates,
            error: Some(error),
        };
    }

    ParseResult {
        data,
        duplicates,
        error: None,
    }
}
