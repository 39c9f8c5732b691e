//! Workbook fixtures serialised as JSON.
//!
//! ```json
//! { "sheets": [ { "name": "Data",
//!                 "merged_cells": ["A1:B2"],
//!                 "cells": [ { "cell": "B3", "value": { "type": "Number", "value": 44197 } },
//!                            { "cell": "C3", "formula": "B3+1",
//!                              "value": { "type": "Number", "value": 44198 } } ] } ] }
//! ```

use crate::error::{IoError, with_cell_context};
use crate::traits::{
    BackendCaps, CellComment, CellData, CellStyle, MergedRange, SheetData, SpreadsheetReader,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sheetfeed_common::{CellRef, CellValue, DateSystem, ExcelErrorKind, datetime_to_serial};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct JsonWorkbook {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    sheets: Vec<JsonSheet>,
}

fn default_version() -> u32 {
    1
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct JsonSheet {
    name: String,
    #[serde(default)]
    cells: Vec<JsonCell>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    date_system_1904: bool,
    /// A1 ranges such as `A1:B2`.
    #[serde(default)]
    merged_cells: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct JsonCell {
    cell: String,
    #[serde(default)]
    value: Option<JsonValue>,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    style: Option<CellStyle>,
    #[serde(default)]
    comment: Option<CellComment>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "value")]
enum JsonValue {
    Number(f64),
    Int(i64),
    Text(String),
    Boolean(bool),
    Error(String),
    Empty,
    /// `YYYY-MM-DD`, stored as a serial number.
    Date(String),
    /// `YYYY-MM-DDTHH:MM:SS[.fff]`, stored as a serial number.
    DateTime(String),
}

pub struct JsonAdapter {
    data: JsonWorkbook,
    caps: BackendCaps,
}

impl Default for JsonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonAdapter {
    pub fn new() -> Self {
        Self {
            data: JsonWorkbook::default(),
            caps: BackendCaps {
                read: true,
                formulas: true,
                styles: true,
                comments: true,
                merged_cells: true,
                bytes_input: true,
                date_system_1904: true,
            },
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, IoError> {
        let mut adapter = Self::new();
        adapter.data = serde_json::from_str(json)?;
        Ok(adapter)
    }

    fn to_sheet_data(js: &JsonSheet) -> Result<SheetData, IoError> {
        let mut sheet = SheetData::new(js.name.clone());
        sheet.hidden = js.hidden;
        if js.date_system_1904 {
            sheet.date_system = DateSystem::Excel1904;
        }

        for c in &js.cells {
            let at = CellRef::parse_a1(&c.cell)?;
            let value = match &c.value {
                Some(v) => json_to_value(v)
                    .map_err(|msg| with_cell_context(&js.name, at.row, at.col, msg))?,
                None => CellValue::Blank,
            };
            let mut data = match &c.formula {
                Some(f) => CellData::from_formula(f.clone(), value),
                None => CellData::from_value(value),
            };
            data.style = c.style.clone();
            data.comment = c.comment.clone();
            sheet.insert(at.row, at.col, data);
        }

        for range in &js.merged_cells {
            sheet.merged_cells.push(MergedRange::parse(range)?);
        }
        Ok(sheet)
    }
}

fn json_to_value(v: &JsonValue) -> Result<CellValue, String> {
    Ok(match v {
        JsonValue::Number(n) => CellValue::Numeric(*n),
        JsonValue::Int(i) => CellValue::Int(*i),
        JsonValue::Text(s) => CellValue::Text(s.clone()),
        JsonValue::Boolean(b) => CellValue::Boolean(*b),
        JsonValue::Empty => CellValue::Blank,
        JsonValue::Error(e) => CellValue::Error(
            ExcelErrorKind::parse(e).ok_or_else(|| format!("unknown error code `{e}`"))?,
        ),
        JsonValue::Date(s) => {
            let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| format!("invalid date `{s}`: {e}"))?;
            CellValue::Numeric(datetime_to_serial(&d.and_time(NaiveTime::MIN)))
        }
        JsonValue::DateTime(s) => {
            let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|e| format!("invalid datetime `{s}`: {e}"))?;
            CellValue::Numeric(datetime_to_serial(&dt))
        }
    })
}

impl SpreadsheetReader for JsonAdapter {
    fn capabilities(&self) -> BackendCaps {
        self.caps.clone()
    }

    fn sheet_names(&self) -> Result<Vec<String>, IoError> {
        Ok(self.data.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn open_bytes(data: Vec<u8>) -> Result<Self, IoError> {
        let mut adapter = Self::new();
        adapter.data = serde_json::from_slice(&data)?;
        Ok(adapter)
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, IoError> {
        let js = self
            .data
            .sheets
            .iter()
            .find(|s| s.name == sheet)
            .ok_or_else(|| IoError::SheetNotFound(sheet.to_string()))?;
        Self::to_sheet_data(js)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetfeed_common::CellType;

    const BOOK: &str = r##"{
        "sheets": [
            { "name": "Data",
              "merged_cells": ["A1:B2"],
              "cells": [
                { "cell": "A1", "value": { "type": "Text", "value": "head" } },
                { "cell": "B3", "value": { "type": "Date", "value": "2021-01-01" } },
                { "cell": "C3", "formula": "=B3+1", "value": { "type": "Number", "value": 44198 } },
                { "cell": "D3", "value": { "type": "Error", "value": "#DIV/0!" },
                  "comment": { "author": "amy", "text": "check" } }
              ] },
            { "name": "Empty" }
        ]
    }"##;

    #[test]
    fn reads_cells_in_sheet_order() {
        let mut adapter = JsonAdapter::from_json_str(BOOK).unwrap();
        assert_eq!(adapter.sheet_names().unwrap(), vec!["Data", "Empty"]);

        let book = adapter.read_workbook().unwrap();
        let data = book.sheet("Data").unwrap();
        assert_eq!(data.cell(2, 1).unwrap().value, CellValue::Numeric(44197.0));

        let formula = data.cell(2, 2).unwrap();
        assert_eq!(formula.formula.as_deref(), Some("B3+1"));
        assert_eq!(formula.cell_type(), CellType::Formula);

        let err = data.cell(2, 3).unwrap();
        assert_eq!(err.value, CellValue::Error(ExcelErrorKind::Div));
        assert_eq!(err.comment.as_ref().unwrap().author.as_deref(), Some("amy"));

        assert!(data.merged_region_at(1, 1).is_some());
        assert!(book.sheet("Empty").unwrap().cells.is_empty());
    }

    #[test]
    fn bad_error_code_reports_cell() {
        let json = r##"{ "sheets": [ { "name": "S", "cells": [
            { "cell": "B2", "value": { "type": "Error", "value": "#WHAT" } } ] } ] }"##;
        let mut adapter = JsonAdapter::from_json_str(json).unwrap();
        let err = adapter.read_sheet("S").unwrap_err();
        assert!(err.to_string().ends_with("at S!B2"), "{err}");
    }

    #[test]
    fn missing_sheet() {
        let mut adapter = JsonAdapter::from_json_str(BOOK).unwrap();
        assert!(matches!(
            adapter.read_sheet("Nope"),
            Err(IoError::SheetNotFound(_))
        ));
    }
}
