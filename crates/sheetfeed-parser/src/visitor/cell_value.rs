//! Cell value dispatch: picks the `visit_*` call matching what a cell holds.

use super::CellVisitor;
use crate::binding::{ColumnBinding, ValueType};
use crate::config::ErrorStrategy;
use crate::error::ParseError;
use crate::record::CellHandle;
use crate::schema::ColumnType;
use crate::sink::RowWriter;
use sheetfeed_common::{CellValue, ExcelErrorKind};

/// Forward the content of `cell` to `visitor`.
///
/// `cell_formula` columns read the formula text of formula cells and the
/// value of every other cell. Blank cells inside a merged region resolve to
/// the region's top-left cell when `search_merged_cell` is set.
pub fn visit_cell_value(
    binding: &ColumnBinding,
    cell: &CellHandle<'_>,
    visitor: &dyn CellVisitor,
    out: &mut dyn RowWriter,
) -> Result<(), ParseError> {
    let data = cell.data();
    if binding.value_type == ValueType::CellFormula {
        if let Some(formula) = data.formula.as_deref() {
            return visitor.visit_string(binding, formula, out);
        }
    }
    match &data.value {
        CellValue::Numeric(n) => visitor.visit_numeric(binding, *n, out),
        // A whole-number cell in a timestamp column is a date serial, not epoch millis
        CellValue::Int(i) if binding.column.column_type == ColumnType::Timestamp => {
            visitor.visit_numeric(binding, *i as f64, out)
        }
        CellValue::Int(i) => visitor.visit_long(binding, *i, out),
        CellValue::Text(s) => visitor.visit_string(binding, s, out),
        CellValue::Boolean(b) => visitor.visit_boolean(binding, *b, out),
        CellValue::Error(kind) => visit_cell_error(binding, *kind, visitor, out),
        CellValue::Blank => match merged_origin(binding, cell) {
            Some(origin) => visit_cell_value(binding, &origin, visitor, out),
            None => visitor.visit_null(binding, out),
        },
    }
}

fn visit_cell_error(
    binding: &ColumnBinding,
    kind: ExcelErrorKind,
    visitor: &dyn CellVisitor,
    out: &mut dyn RowWriter,
) -> Result<(), ParseError> {
    match &binding.on_cell_error {
        ErrorStrategy::Null | ErrorStrategy::Constant(None) => visitor.visit_null(binding, out),
        ErrorStrategy::Constant(Some(value)) => visitor.visit_string(binding, value, out),
        ErrorStrategy::ErrorCode => visitor.visit_error(binding, kind, out),
        ErrorStrategy::Exception => Err(ParseError::CellError {
            code: kind.code(),
            label: kind.label(),
        }),
    }
}

// Top-left cell of the merged region covering a blank cell, if it differs.
fn merged_origin<'a>(binding: &ColumnBinding, cell: &CellHandle<'a>) -> Option<CellHandle<'a>> {
    if !binding.search_merged_cell {
        return None;
    }
    let sheet = cell.sheet();
    let region = sheet.merged_region_at(cell.row(), cell.col())?;
    if (region.start_row, region.start_col) == (cell.row(), cell.col()) {
        return None;
    }
    CellHandle::at(sheet, region.start_row, region.start_col)
}
