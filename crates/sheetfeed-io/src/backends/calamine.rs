#![cfg(feature = "calamine")]

use crate::error::IoError;
use crate::traits::{BackendCaps, CellData, SheetData, SpreadsheetReader};
use sheetfeed_common::{CellValue, DateSystem, ExcelErrorKind};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{
    Data, ExcelDateTime, ExcelDateTimeType, Range, Reader, Sheets, open_workbook_auto_from_rs,
};

/// Values-only reader for xlsx, xlsm, xlsb, xls and ods. Styles, comments
/// and merged regions are not available through calamine.
pub struct CalamineAdapter {
    workbook: Sheets<Cursor<Vec<u8>>>,
}

impl CalamineAdapter {
    fn convert_value(data: &Data) -> CellValue {
        match data {
            Data::Empty => CellValue::Blank,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Numeric(*f),
            // Integer cells may still carry a date serial
            Data::Int(i) => CellValue::Numeric(*i as f64),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::Error(e) => {
                let kind = match e {
                    calamine::CellErrorType::Div0 => ExcelErrorKind::Div,
                    calamine::CellErrorType::NA => ExcelErrorKind::Na,
                    calamine::CellErrorType::Name => ExcelErrorKind::Name,
                    calamine::CellErrorType::Null => ExcelErrorKind::Null,
                    calamine::CellErrorType::Num => ExcelErrorKind::Num,
                    calamine::CellErrorType::Ref => ExcelErrorKind::Ref,
                    calamine::CellErrorType::GettingData => ExcelErrorKind::GettingData,
                    _ => ExcelErrorKind::Value,
                };
                CellValue::Error(kind)
            }
            // Date-formatted cells keep their serial
            Data::DateTime(dt) => CellValue::Numeric(dt.as_f64()),
            Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }

    /// calamine keeps the workbook's epoch private; comparing against a
    /// 1900-based twin of the same serial reveals it.
    fn is_1904(dt: &ExcelDateTime) -> bool {
        let kind = if dt.is_duration() {
            ExcelDateTimeType::TimeDelta
        } else {
            ExcelDateTimeType::DateTime
        };
        *dt != ExcelDateTime::new(dt.as_f64(), kind, false)
    }

    fn date_system(range: &Range<Data>) -> DateSystem {
        let uses_1904 = range.used_cells().any(|(_, _, val)| match val {
            Data::DateTime(dt) => Self::is_1904(dt),
            _ => false,
        });
        if uses_1904 {
            DateSystem::Excel1904
        } else {
            DateSystem::Excel1900
        }
    }

    fn range_to_cells(
        range: &Range<Data>,
        formulas: Option<&Range<String>>,
    ) -> BTreeMap<(u32, u32), CellData> {
        let mut cells = BTreeMap::new();

        // used_cells() yields offsets relative to the range start
        let (start_row, start_col) = range.start().unwrap_or_default();
        for (row, col, val) in range.used_cells() {
            let value = match val {
                Data::String(s) if s.is_empty() => continue,
                _ => Self::convert_value(val),
            };
            cells.insert(
                (row as u32 + start_row, col as u32 + start_col),
                CellData::from_value(value),
            );
        }

        if let Some(frm_range) = formulas {
            let (start_row, start_col) = frm_range.start().unwrap_or_default();
            for (row, col, formula) in frm_range.used_cells() {
                if formula.is_empty() {
                    continue;
                }
                let key = (row as u32 + start_row, col as u32 + start_col);
                let cached = cells.remove(&key).map(|c| c.value).unwrap_or_default();
                cells.insert(key, CellData::from_formula(formula.clone(), cached));
            }
        }

        cells
    }
}

impl SpreadsheetReader for CalamineAdapter {
    fn capabilities(&self) -> BackendCaps {
        BackendCaps {
            read: true,
            formulas: true,
            bytes_input: true,
            date_system_1904: true,
            ..Default::default()
        }
    }

    fn sheet_names(&self) -> Result<Vec<String>, IoError> {
        Ok(self.workbook.sheet_names().to_vec())
    }

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let bytes = std::fs::read(path)?;
        Self::open_bytes(bytes)
    }

    fn open_bytes(data: Vec<u8>) -> Result<Self, IoError> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| IoError::from_backend("calamine", e))?;
        Ok(Self { workbook })
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, IoError> {
        if !self.workbook.sheet_names().iter().any(|n| n == sheet) {
            return Err(IoError::SheetNotFound(sheet.to_string()));
        }
        let range = self
            .workbook
            .worksheet_range(sheet)
            .map_err(|e| IoError::from_backend("calamine", e))?;
        // Formulas are optional; some formats expose none
        let formulas = self.workbook.worksheet_formula(sheet).ok();

        let mut data = SheetData::new(sheet);
        data.date_system = Self::date_system(&range);
        data.cells = Self::range_to_cells(&range, formulas.as_ref());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_cells_become_numeric_serials() {
        assert_eq!(
            CalamineAdapter::convert_value(&Data::Int(44197)),
            CellValue::Numeric(44197.0)
        );
        assert_eq!(
            CalamineAdapter::convert_value(&Data::Float(1.5)),
            CellValue::Numeric(1.5)
        );
    }

    #[test]
    fn date_cells_report_their_epoch() {
        let mut range = Range::new((0, 0), (1, 0));
        range.set_value(
            (0, 0),
            Data::DateTime(ExcelDateTime::new(
                42735.0,
                ExcelDateTimeType::DateTime,
                false,
            )),
        );
        assert_eq!(CalamineAdapter::date_system(&range), DateSystem::Excel1900);

        range.set_value(
            (1, 0),
            Data::DateTime(ExcelDateTime::new(
                41273.0,
                ExcelDateTimeType::DateTime,
                true,
            )),
        );
        assert_eq!(CalamineAdapter::date_system(&range), DateSystem::Excel1904);
    }

    #[test]
    fn plain_numbers_default_to_1900() {
        let mut range = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::Float(3.0));
        range.set_value((0, 1), Data::Int(7));
        assert_eq!(CalamineAdapter::date_system(&range), DateSystem::Excel1900);
    }
}
