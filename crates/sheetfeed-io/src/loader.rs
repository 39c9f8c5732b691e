use crate::error::IoError;
use crate::traits::{SpreadsheetReader, WorkbookData};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default, Clone)]
pub struct LoaderStats {
    pub sheets_loaded: usize,
    pub cells_loaded: usize,
    pub formulas_loaded: usize,
    pub load_time_ms: u64,
}

/// Drains a backend into an in-memory [`WorkbookData`].
pub struct WorkbookLoader<B: SpreadsheetReader> {
    backend: B,
    stats: LoaderStats,
}

impl<B: SpreadsheetReader> WorkbookLoader<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            stats: LoaderStats::default(),
        }
    }

    pub fn stats(&self) -> &LoaderStats {
        &self.stats
    }

    pub fn load(&mut self) -> Result<WorkbookData, IoError> {
        let start = Instant::now();
        let book = self.backend.read_workbook()?;

        self.stats.sheets_loaded = book.sheets.len();
        self.stats.cells_loaded = book.sheets.iter().map(|s| s.cells.len()).sum();
        self.stats.formulas_loaded = book
            .sheets
            .iter()
            .flat_map(|s| s.cells.values())
            .filter(|c| c.is_formula())
            .count();
        self.stats.load_time_ms = start.elapsed().as_millis() as u64;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sheets = self.stats.sheets_loaded,
            cells = self.stats.cells_loaded,
            formulas = self.stats.formulas_loaded,
            ms = self.stats.load_time_ms,
            "workbook loaded"
        );
        Ok(book)
    }
}

/// Open `path` with the backend matching its extension and read every sheet.
///
/// `.json` goes to the JSON fixture reader, `.xlsx`/`.xlsm` to umya (or
/// calamine when umya is disabled) and `.xls`/`.xlsb`/`.ods` to calamine.
pub fn load_workbook<P: AsRef<Path>>(path: P) -> Result<WorkbookData, IoError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("load_workbook", path = %path.display(), ext = %ext).entered();

    match ext.as_str() {
        #[cfg(feature = "json")]
        "json" => load_with::<crate::backends::JsonAdapter>(path),
        #[cfg(feature = "umya")]
        "xlsx" | "xlsm" => load_with::<crate::backends::UmyaAdapter>(path),
        #[cfg(all(feature = "calamine", not(feature = "umya")))]
        "xlsx" | "xlsm" => load_with::<crate::backends::CalamineAdapter>(path),
        #[cfg(feature = "calamine")]
        "xls" | "xlsb" | "ods" => load_with::<crate::backends::CalamineAdapter>(path),
        other => Err(IoError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })),
    }
}

#[allow(dead_code)]
fn load_with<B: SpreadsheetReader>(path: &Path) -> Result<WorkbookData, IoError> {
    let backend = B::open_path(path)?;
    WorkbookLoader::new(backend).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_workbook("book.txt").unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat(ref e) if e == "txt"), "{err}");
    }

    #[cfg(feature = "json")]
    #[test]
    fn loads_json_fixture_with_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        std::fs::write(
            &path,
            r#"{ "sheets": [ { "name": "S", "cells": [
                { "cell": "A1", "value": { "type": "Number", "value": 1 } },
                { "cell": "A2", "formula": "A1*2", "value": { "type": "Number", "value": 2 } } ] } ] }"#,
        )
        .unwrap();

        let adapter = crate::backends::JsonAdapter::open_path(&path).unwrap();
        let mut loader = WorkbookLoader::new(adapter);
        let book = loader.load().unwrap();
        assert_eq!(book.sheet_names(), vec!["S"]);
        assert_eq!(loader.stats().cells_loaded, 2);
        assert_eq!(loader.stats().formulas_loaded, 1);

        assert_eq!(load_workbook(&path).unwrap().sheets.len(), 1);
    }
}
