use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Largest meter id: the biggest integer an upload cell can carry without
/// losing precision. Every id therefore also fits a SQLite integer.
pub const MAX_METER_ID: u64 = 9_007_199_254_740_991;

/// Identifier of a single utility meter. Always a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeterId(u64);

impl MeterId {
    pub fn new(value: u64) -> Option<Self> {
        (1..=MAX_METER_ID).contains(&value).then_some(MeterId(value))
    }

    /// Accepts a coerced cell value when it is a finite, positive, whole number.
    /// Fractional values such as `2.5` are not meter ids and yield `None`.
    pub fn from_number(value: f64) -> Option<Self> {
        if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > MAX_METER_ID as f64
        {
            return None;
        }
        MeterId::new(value as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MeterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid meter id: {0:?}")]
pub struct InvalidMeterId(pub String);

impl FromStr for MeterId {
    type Err = InvalidMeterId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(MeterId::new)
            .ok_or_else(|| InvalidMeterId(s.to_string()))
    }
}

impl TryFrom<i64> for MeterId {
    type Error = InvalidMeterId;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .ok()
            .and_then(MeterId::new)
            .ok_or_else(|| InvalidMeterId(value.to_string()))
    }
}

pub type MeterSet = BTreeSet<MeterId>;

pub fn join_meter_ids<'a>(ids: impl IntoIterator<Item = &'a MeterId>) -> String {
    ids.into_iter()
        .map(MeterId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One raw cell of an uploaded file, before any meter id coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Loose numeric conversion: surrounding whitespace is ignored, empty
    /// text is zero and anything unparseable is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            CellValue::Null => 0.0,
            CellValue::Number(value) => *value,
            CellValue::Bool(value) => {
                if *value {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Text(text) => parse_loose_number(text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

fn parse_loose_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|value| value as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // f64::from_str also takes "inf" and "nan", which are not numbers here.
    let plain_decimal = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !plain_decimal {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// A parsed upload row keyed by header, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRow {
    cells: Vec<(String, CellValue)>,
}

impl ParsedRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cell. A repeated header keeps its first position and takes the
    /// latest value.
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<CellValue>) {
        let header = header.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(key, _)| *key == header) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((header, value)),
        }
    }

    pub fn with(mut self, header: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(header, value);
        self
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value)
    }

    pub fn headers(&self) -> Vec<String> {
        self.cells.iter().map(|(key, _)| key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_id_rejects_zero_fractions_and_non_finite() {
        assert_eq!(MeterId::new(0), None);
        assert_eq!(MeterId::from_number(0.0), None);
        assert_eq!(MeterId::from_number(-3.0), None);
        assert_eq!(MeterId::from_number(1.5), None);
        assert_eq!(MeterId::from_number(f64::NAN), None);
        assert_eq!(MeterId::from_number(f64::INFINITY), None);
        assert_eq!(MeterId::from_number(42.0).map(MeterId::get), Some(42));
    }

    #[test]
    fn text_cells_coerce_loosely() {
        assert_eq!(CellValue::from(" 100 ").to_number(), 100.0);
        assert_eq!(CellValue::from("").to_number(), 0.0);
        assert_eq!(CellValue::from("1e3").to_number(), 1000.0);
        assert_eq!(CellValue::from("0x10").to_number(), 16.0);
        assert!(CellValue::from("abc").to_number().is_nan());
        assert!(CellValue::from("inf").to_number().is_nan());
        assert!(CellValue::from("12abc").to_number().is_nan());
        assert_eq!(CellValue::from("-Infinity").to_number(), f64::NEG_INFINITY);
        assert_eq!(CellValue::Bool(true).to_number(), 1.0);
    }

    #[test]
    fn parsed_row_overwrites_repeated_header_in_place() {
        let row = ParsedRow::new()
            .with("meter_id", "1")
            .with("name", "a")
            .with("meter_id", "2");

        assert_eq!(row.headers(), vec!["meter_id".to_string(), "name".to_string()]);
        assert_eq!(row.get("meter_id"), Some(&CellValue::from("2")));
    }

    #[test]
    fn meter_id_parses_trimmed_decimal() {
        assert_eq!("  7 ".parse::<MeterId>().map(MeterId::get), Ok(7));
        assert!("0".parse::<MeterId>().is_err());
        assert!("x1".parse::<MeterId>().is_err());
    }

    #[test]
    fn meter_id_is_capped_at_exact_integer_range() {
        assert_eq!(MeterId::new(MAX_METER_ID).map(MeterId::get), Some(MAX_METER_ID));
        assert_eq!(MeterId::new(MAX_METER_ID + 1), None);
        assert!("18446744073709551615".parse::<MeterId>().is_err());
        assert!("9007199254740992".parse::<MeterId>().is_err());
        assert_eq!(MeterId::from_number(9_007_199_254_740_992.0), None);
    }

    #[test]
    fn stored_integers_convert_back_checked() {
        assert_eq!(MeterId::try_from(12_i64).map(MeterId::get), Ok(12));
        assert!(MeterId::try_from(-1_i64).is_err());
        assert!(MeterId::try_from(0_i64).is_err());
        assert!(MeterId::try_from(i64::MAX).is_err());
    }
}
