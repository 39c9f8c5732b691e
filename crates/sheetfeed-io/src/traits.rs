use crate::error::IoError;
use serde::{Deserialize, Serialize};
use sheetfeed_common::{A1ParseError, CellRef, CellType, CellValue, DateSystem};
use std::collections::BTreeMap;
use std::path::Path;

/// One populated cell. Formula cells keep the formula text (without the
/// leading `=`) and the cached result the writing application stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellData {
    pub value: CellValue,
    pub formula: Option<String>,
    pub style: Option<CellStyle>,
    pub comment: Option<CellComment>,
}

impl CellData {
    pub fn from_value<V: Into<CellValue>>(value: V) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Formula cell with its cached result.
    pub fn from_formula(formula: impl Into<String>, cached: CellValue) -> Self {
        let formula = formula.into();
        let formula = match formula.strip_prefix('=') {
            Some(stripped) => stripped.to_string(),
            None => formula,
        };
        Self {
            value: cached,
            formula: Some(formula),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_comment(mut self, comment: CellComment) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Stored type: `Formula` for formula cells, else the kind of the value.
    pub fn cell_type(&self) -> CellType {
        if self.is_formula() {
            CellType::Formula
        } else {
            self.value.cell_type()
        }
    }

    /// Type of the cached result of a formula cell.
    pub fn cached_type(&self) -> CellType {
        self.value.cell_type()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub number_format: Option<String>,
    pub number_format_id: Option<u32>,
    pub horizontal_alignment: Option<String>,
    pub vertical_alignment: Option<String>,
    pub wrap_text: Option<bool>,
    pub fill_pattern: Option<String>,
    pub fill_foreground_color: Option<String>,
    pub fill_background_color: Option<String>,
    pub border_top: Option<String>,
    pub border_bottom: Option<String>,
    pub border_left: Option<String>,
    pub border_right: Option<String>,
    pub locked: Option<bool>,
    pub hidden: Option<bool>,
    pub rotation: Option<u32>,
    pub indent: Option<u32>,
    pub font: Option<CellFont>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<String>,
    pub strikeout: Option<bool>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellComment {
    pub author: Option<String>,
    pub text: String,
    pub visible: Option<bool>,
}

/// Zero-based, inclusive merged region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergedRange {
    /// Parse an A1 range such as `A1:B2`; a single reference is a 1x1 region.
    pub fn parse(range: &str) -> Result<Self, A1ParseError> {
        let (start, end) = range.split_once(':').unwrap_or((range, range));
        let start = CellRef::parse_a1(start)?;
        let end = CellRef::parse_a1(end)?;
        Ok(MergedRange {
            start_row: start.row.min(end.row),
            start_col: start.col.min(end.col),
            end_row: start.row.max(end.row),
            end_col: start.col.max(end.col),
        })
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }
}

/// Fully materialised worksheet. Keys are zero-based `(row, col)`.
#[derive(Clone, Debug, Default)]
pub struct SheetData {
    pub name: String,
    pub cells: BTreeMap<(u32, u32), CellData>,
    pub merged_cells: Vec<MergedRange>,
    pub hidden: bool,
    pub date_system: DateSystem,
}

impl SheetData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&CellData> {
        self.cells.get(&(row, col))
    }

    pub fn insert(&mut self, row: u32, col: u32, data: CellData) {
        self.cells.insert((row, col), data);
    }

    /// Index of the last populated row, `None` for an empty sheet.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|(r, _)| *r)
    }

    /// Index of the last populated column, `None` for an empty sheet.
    pub fn last_col(&self) -> Option<u32> {
        self.cells.keys().map(|(_, c)| *c).max()
    }

    pub fn merged_region_at(&self, row: u32, col: u32) -> Option<&MergedRange> {
        self.merged_cells.iter().find(|m| m.contains(row, col))
    }
}

#[derive(Clone, Debug, Default)]
pub struct WorkbookData {
    pub sheets: Vec<SheetData>,
}

impl WorkbookData {
    pub fn sheet(&self, name: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheets(&self) -> &[SheetData] {
        &self.sheets
    }
}

#[derive(Clone, Debug, Default)]
pub struct BackendCaps {
    pub read: bool,
    pub formulas: bool,
    pub styles: bool,
    pub comments: bool,
    pub merged_cells: bool,
    pub bytes_input: bool,
    pub date_system_1904: bool,
}

pub trait SpreadsheetReader {
    fn capabilities(&self) -> BackendCaps;
    fn sheet_names(&self) -> Result<Vec<String>, IoError>;

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError>
    where
        Self: Sized;

    fn open_bytes(data: Vec<u8>) -> Result<Self, IoError>
    where
        Self: Sized;

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, IoError>;

    /// Read every sheet in workbook order.
    fn read_workbook(&mut self) -> Result<WorkbookData, IoError> {
        let mut sheets = Vec::new();
        for name in self.sheet_names()? {
            sheets.push(self.read_sheet(&name)?);
        }
        Ok(WorkbookData { sheets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_cells_report_both_types() {
        let cell = CellData::from_formula("=SUM(A1:A2)", CellValue::Numeric(3.0));
        assert_eq!(cell.formula.as_deref(), Some("SUM(A1:A2)"));
        assert_eq!(cell.cell_type(), CellType::Formula);
        assert_eq!(cell.cached_type(), CellType::Numeric);

        let plain = CellData::from_value("x");
        assert_eq!(plain.cell_type(), CellType::String);
        assert_eq!(plain.cached_type(), CellType::String);
    }

    #[test]
    fn sheet_bounds_and_merges() {
        let mut sheet = SheetData::new("S");
        assert_eq!(sheet.last_row(), None);
        sheet.insert(0, 3, CellData::from_value(1.0));
        sheet.insert(4, 1, CellData::from_value(2.0));
        assert_eq!(sheet.last_row(), Some(4));
        assert_eq!(sheet.last_col(), Some(3));

        sheet.merged_cells.push(MergedRange::parse("C2:A1").unwrap());
        assert!(sheet.merged_region_at(1, 2).is_some());
        assert!(sheet.merged_region_at(2, 0).is_none());
    }
}
