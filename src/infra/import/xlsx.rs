use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use crate::domain::entities::meter::{CellValue, ParsedRow};

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Float(v) => CellValue::Number(*v),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::String(v) => CellValue::Text(v.clone()),
        other => CellValue::Text(cell_to_string(other)),
    }
}

/// Reads the first worksheet; its first row is the header.
pub fn read_xlsx_rows(xlsx_path: &Path) -> Result<Vec<ParsedRow>> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open workbook: {}", xlsx_path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("workbook has no sheets: {}", xlsx_path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    let mut sheet_rows = range.rows();
    let Some(header_cells) = sheet_rows.next() else {
        anyhow::bail!("sheet {sheet_name} is empty")
    };
    let headers: Vec<String> = header_cells.iter().map(cell_to_string).collect();

    let rows = sheet_rows
        .map(|cells| {
            let mut row = ParsedRow::new();
            for (col_idx, header) in headers.iter().enumerate() {
                let value = cells.get(col_idx).map(cell_to_value).unwrap_or(CellValue::Null);
                row.insert(header.clone(), value);
            }
            row
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_stay_numeric() {
        assert_eq!(cell_to_value(&Data::Int(42)), CellValue::Number(42.0));
        assert_eq!(cell_to_value(&Data::Float(7.0)), CellValue::Number(7.0));
        assert_eq!(cell_to_value(&Data::Empty), CellValue::Null);
        assert_eq!(
            cell_to_value(&Data::String(" 9 ".to_string())),
            CellValue::Text(" 9 ".to_string())
        );
    }
}
