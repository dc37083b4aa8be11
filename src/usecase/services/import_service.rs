use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::domain::entities::meter::ParsedRow;
use crate::infra::import::csv::read_delimited_rows;
use crate::infra::import::xlsx::read_xlsx_rows;

pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["csv", "tsv", "txt", "xls", "xlsx", "xlsm", "ods"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportService;

impl ImportService {
    pub fn new() -> Self {
        Self
    }

    /// Turns an uploaded file into header-keyed rows.
    pub fn load_rows(&self, path: &Path) -> Result<Vec<ParsedRow>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let rows = match extension.as_str() {
            "csv" | "tsv" | "txt" => read_delimited_rows(path)?,
            "xls" | "xlsx" | "xlsm" | "ods" => read_xlsx_rows(path)?,
            _ => anyhow::bail!(
                "unsupported file type: {} (expected one of: {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        };

        debug!(path = %path.display(), rows = rows.len(), "upload rows loaded");
        Ok(rows)
    }
}
