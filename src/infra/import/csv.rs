use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::domain::entities::meter::ParsedRow;

/// Picks the field separator for a delimited upload. `.tsv` is always tab;
/// otherwise the header line decides, with comma as the fallback.
pub fn detect_delimiter(path: &Path, header_line: &str) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
    if is_tsv {
        return b'\t';
    }

    if header_line.contains(',') {
        b','
    } else if header_line.contains('\t') {
        b'\t'
    } else if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

pub fn parse_delimited(content: &str, delimiter: u8) -> Result<Vec<ParsedRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .context("failed to read header row")?
        .clone();

    if headers.is_empty() {
        anyhow::bail!("file header is required")
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse record")?;
        let mut row = ParsedRow::new();
        for (col_idx, header) in headers.iter().enumerate() {
            row.insert(header, record.get(col_idx).unwrap_or(""));
        }
        rows.push(row);
    }

    Ok(rows)
}

pub fn read_delimited_rows(path: &Path) -> Result<Vec<ParsedRow>> {
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to open file: {}", path.display()))?;
    let content = String::from_utf8_lossy(&raw);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&*content);

    let header_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(path, header_line);

    parse_delimited(content, delimiter)
        .with_context(|| format!("failed to read rows from: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::meter::CellValue;

    #[test]
    fn delimiter_follows_extension_then_header() {
        assert_eq!(detect_delimiter(Path::new("a.tsv"), "meter_id,x"), b'\t');
        assert_eq!(detect_delimiter(Path::new("a.txt"), "meter_id\tsite"), b'\t');
        assert_eq!(detect_delimiter(Path::new("a.csv"), "meter_id;site"), b';');
        assert_eq!(detect_delimiter(Path::new("a.csv"), "meter_id"), b',');
    }

    #[test]
    fn short_records_get_blank_cells() {
        let rows = parse_delimited("meter_id,site\n100,north\n200\n", b',')
            .expect("should parse rows");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("site"), Some(&CellValue::from("")));
        assert_eq!(rows[1].get("meter_id"), Some(&CellValue::from("200")));
    }
}
