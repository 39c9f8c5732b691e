//! Record cursors: how a sheet is walked and where a binding's cell lives
//! in the current record.

use crate::binding::{ColumnBinding, SheetBindings};
use crate::config::RecordType;
use crate::error::ParseError;
use sheetfeed_common::CellRef;
use sheetfeed_io::{CellData, SheetData};

/// A populated cell together with its position and owning sheet.
#[derive(Debug, Clone, Copy)]
pub struct CellHandle<'a> {
    sheet: &'a SheetData,
    row: u32,
    col: u32,
    data: &'a CellData,
}

impl<'a> CellHandle<'a> {
    /// `None` when the sheet has no cell at `(row, col)`.
    pub fn at(sheet: &'a SheetData, row: u32, col: u32) -> Option<Self> {
        sheet.cell(row, col).map(|data| Self {
            sheet,
            row,
            col,
            data,
        })
    }

    pub fn sheet(&self) -> &'a SheetData {
        self.sheet
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn data(&self) -> &'a CellData {
        self.data
    }

    /// `Sheet!A1` coordinate of this cell.
    pub fn reference(&self) -> CellRef {
        CellRef::new(self.row, self.col).with_sheet(self.sheet.name())
    }
}

pub trait RecordCursor<'a> {
    fn sheet(&self) -> &'a SheetData;

    fn exists(&self) -> bool;

    fn move_next(&mut self);

    fn row_index(&self, binding: &ColumnBinding) -> Result<u32, ParseError>;

    fn column_index(&self, binding: &ColumnBinding) -> Result<u32, ParseError>;

    /// Cell for `binding` in the current record; `Ok(None)` when absent.
    fn cell(&self, binding: &ColumnBinding) -> Result<Option<CellHandle<'a>>, ParseError>;

    /// Coordinate used in error messages; `None` when the record has no
    /// single cell for `binding`.
    fn cell_reference(&self, binding: &ColumnBinding) -> Option<CellRef>;
}

/// One record per physical row, from `skip_header_lines` to the last
/// populated row.
pub struct RowRecord<'a> {
    sheet: &'a SheetData,
    row: u32,
    end: Option<u32>,
}

impl<'a> RowRecord<'a> {
    pub fn new(sheet: &'a SheetData, skip_header_lines: u32) -> Self {
        Self {
            sheet,
            row: skip_header_lines,
            end: sheet.last_row(),
        }
    }
}

impl<'a> RecordCursor<'a> for RowRecord<'a> {
    fn sheet(&self) -> &'a SheetData {
        self.sheet
    }

    fn exists(&self) -> bool {
        self.end.is_some_and(|end| self.row <= end)
    }

    fn move_next(&mut self) {
        self.row += 1;
    }

    fn row_index(&self, _binding: &ColumnBinding) -> Result<u32, ParseError> {
        Ok(self.row)
    }

    fn column_index(&self, binding: &ColumnBinding) -> Result<u32, ParseError> {
        Ok(binding.cursor_index)
    }

    fn cell(&self, binding: &ColumnBinding) -> Result<Option<CellHandle<'a>>, ParseError> {
        Ok(CellHandle::at(self.sheet, self.row, binding.cursor_index))
    }

    fn cell_reference(&self, binding: &ColumnBinding) -> Option<CellRef> {
        Some(CellRef::new(self.row, binding.cursor_index).with_sheet(self.sheet.name()))
    }
}

/// One record per physical column, from `skip_header_lines` to the last
/// populated column.
pub struct ColumnRecord<'a> {
    sheet: &'a SheetData,
    col: u32,
    end: Option<u32>,
}

impl<'a> ColumnRecord<'a> {
    pub fn new(sheet: &'a SheetData, skip_header_lines: u32) -> Self {
        Self {
            sheet,
            col: skip_header_lines,
            end: sheet.last_col(),
        }
    }
}

impl<'a> RecordCursor<'a> for ColumnRecord<'a> {
    fn sheet(&self) -> &'a SheetData {
        self.sheet
    }

    fn exists(&self) -> bool {
        self.end.is_some_and(|end| self.col <= end)
    }

    fn move_next(&mut self) {
        self.col += 1;
    }

    fn row_index(&self, binding: &ColumnBinding) -> Result<u32, ParseError> {
        Ok(binding.cursor_index)
    }

    fn column_index(&self, _binding: &ColumnBinding) -> Result<u32, ParseError> {
        Ok(self.col)
    }

    fn cell(&self, binding: &ColumnBinding) -> Result<Option<CellHandle<'a>>, ParseError> {
        Ok(CellHandle::at(self.sheet, binding.cursor_index, self.col))
    }

    fn cell_reference(&self, binding: &ColumnBinding) -> Option<CellRef> {
        Some(CellRef::new(binding.cursor_index, self.col).with_sheet(self.sheet.name()))
    }
}

/// The whole sheet as a single record; only sheet-level and fixed-address
/// columns can be served.
pub struct SheetRecord<'a> {
    sheet: &'a SheetData,
    exists: bool,
}

impl<'a> SheetRecord<'a> {
    pub fn new(sheet: &'a SheetData) -> Self {
        Self {
            sheet,
            exists: true,
        }
    }

    fn unsupported() -> ParseError {
        ParseError::UnsupportedConfiguration("unsupported at record_type=sheet".into())
    }
}

impl<'a> RecordCursor<'a> for SheetRecord<'a> {
    fn sheet(&self) -> &'a SheetData {
        self.sheet
    }

    fn exists(&self) -> bool {
        self.exists
    }

    fn move_next(&mut self) {
        self.exists = false;
    }

    fn row_index(&self, _binding: &ColumnBinding) -> Result<u32, ParseError> {
        Err(Self::unsupported())
    }

    fn column_index(&self, _binding: &ColumnBinding) -> Result<u32, ParseError> {
        Err(Self::unsupported())
    }

    fn cell(&self, _binding: &ColumnBinding) -> Result<Option<CellHandle<'a>>, ParseError> {
        Err(Self::unsupported())
    }

    fn cell_reference(&self, _binding: &ColumnBinding) -> Option<CellRef> {
        None
    }
}

/// Cursor matching the bindings' record type.
pub fn cursor_for<'a>(
    sheet: &'a SheetData,
    bindings: &SheetBindings,
) -> Box<dyn RecordCursor<'a> + 'a> {
    match bindings.record_type() {
        RecordType::Row => Box::new(RowRecord::new(sheet, bindings.skip_header_lines())),
        RecordType::Column => Box::new(ColumnRecord::new(sheet, bindings.skip_header_lines())),
        RecordType::Sheet => Box::new(SheetRecord::new(sheet)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, ParserConfig};
    use crate::schema::ColumnType;

    fn sheet_with_rows(rows: u32) -> SheetData {
        let mut sheet = SheetData::new("Data");
        for r in 0..rows {
            sheet.insert(r, 0, CellData::from_value(r as f64));
        }
        sheet
    }

    fn bindings(record_type: RecordType) -> SheetBindings {
        let mut config = ParserConfig::new(
            vec!["Data".into()],
            vec![ColumnConfig::new("a", ColumnType::Double)],
        );
        config.record_type = record_type;
        SheetBindings::bind(&config, "Data").unwrap()
    }

    #[test]
    fn row_cursor_exhausts_after_last_row() {
        let sheet = sheet_with_rows(5);
        let mut cursor = RowRecord::new(&sheet, 0);
        let mut seen = 0;
        for _ in 0..5 {
            assert!(cursor.exists());
            seen += 1;
            cursor.move_next();
        }
        assert_eq!(seen, 5);
        assert!(!cursor.exists());
    }

    #[test]
    fn row_cursor_resolves_cells() {
        let sheet = sheet_with_rows(3);
        let bound = bindings(RecordType::Row);
        let binding = &bound.columns()[0];
        let mut cursor = RowRecord::new(&sheet, 1);
        assert_eq!(cursor.row_index(binding).unwrap(), 1);
        let cell = cursor.cell(binding).unwrap().unwrap();
        assert_eq!(cell.reference().to_string(), "Data!A2");
        cursor.move_next();
        cursor.move_next();
        assert!(!cursor.exists());
    }

    #[test]
    fn empty_sheet_has_no_records() {
        let sheet = SheetData::new("Empty");
        assert!(!RowRecord::new(&sheet, 0).exists());
        assert!(!ColumnRecord::new(&sheet, 0).exists());
    }

    #[test]
    fn column_cursor_is_transposed() {
        let mut sheet = SheetData::new("Data");
        sheet.insert(0, 0, CellData::from_value("x"));
        sheet.insert(0, 2, CellData::from_value("z"));
        let bound = bindings(RecordType::Column);
        let binding = &bound.columns()[0];
        let mut cursor = ColumnRecord::new(&sheet, 0);
        let mut count = 0;
        let mut present = 0;
        while cursor.exists() {
            count += 1;
            if cursor.cell(binding).unwrap().is_some() {
                present += 1;
            }
            cursor.move_next();
        }
        assert_eq!((count, present), (3, 2));
    }

    #[test]
    fn sheet_record_is_single_and_cellless() {
        let sheet = sheet_with_rows(2);
        let bound = bindings(RecordType::Sheet);
        let binding = &bound.columns()[0];
        let mut cursor = SheetRecord::new(&sheet);
        assert!(cursor.exists());
        let err = cursor.cell(binding).unwrap_err();
        assert_eq!(err.to_string(), "unsupported at record_type=sheet");
        assert!(cursor.row_index(binding).is_err());
        assert!(cursor.column_index(binding).is_err());
        assert!(cursor.cell_reference(binding).is_none());
        cursor.move_next();
        assert!(!cursor.exists());
    }
}
