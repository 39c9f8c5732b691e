//! Column value dispatcher.

use super::metadata::{visit_cell_comment, visit_cell_font, visit_cell_style, visit_cell_type};
use super::{AdapterSet, CellVisitor, cell_value::visit_cell_value};
use crate::binding::{ColumnBinding, ValueType};
use crate::error::ParseError;
use crate::record::{CellHandle, RecordCursor};
use crate::sink::RowWriter;
use sheetfeed_common::CellRef;
use sheetfeed_io::{CellType, SheetData, WorkbookData};

/// Produces exactly one write (or one error) per column for the active
/// record.
pub struct ColumnVisitor<'a> {
    workbook: &'a WorkbookData,
    file_name: Option<&'a str>,
    adapters: &'a AdapterSet<'a>,
}

impl<'a> ColumnVisitor<'a> {
    pub fn new(
        workbook: &'a WorkbookData,
        file_name: Option<&'a str>,
        adapters: &'a AdapterSet<'a>,
    ) -> Self {
        Self {
            workbook,
            file_name,
            adapters,
        }
    }

    /// Write the value of `binding` for the record under `cursor`.
    ///
    /// Failures come back as [`ParseError::Column`] carrying the column,
    /// the active sheet and, when known, the cell being read.
    pub fn visit(
        &self,
        binding: &ColumnBinding,
        cursor: &dyn RecordCursor<'a>,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        #[cfg(feature = "tracing")]
        tracing::trace!(column = %binding.column, "start");

        let visitor = self.adapters.for_type(binding.column.column_type);
        self.dispatch(binding, cursor, visitor, out)
            .map_err(|source| {
                let sheet = cursor.sheet().name();
                let cell = match &binding.cell_address {
                    Some(address) => Some(located(address, sheet)),
                    None => cursor.cell_reference(binding),
                };
                ParseError::Column {
                    column: binding.column.to_string(),
                    sheet: sheet.to_string(),
                    cell: cell.map(|c| c.to_string()),
                    source: Box::new(source),
                }
            })?;

        #[cfg(feature = "tracing")]
        tracing::trace!(column = %binding.column, "end");
        Ok(())
    }

    fn dispatch(
        &self,
        binding: &ColumnBinding,
        cursor: &dyn RecordCursor<'a>,
        visitor: &dyn CellVisitor,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        let address = binding.cell_address.as_ref();
        match &binding.value_type {
            ValueType::FileName => return visitor.visit_file_name(binding, self.file_name, out),
            ValueType::SheetName => {
                let sheet = match address {
                    Some(address) => self.sheet_of(address, cursor)?,
                    None => cursor.sheet(),
                };
                return visitor.visit_sheet_name(binding, sheet.name(), out);
            }
            ValueType::RowNumber => {
                let row = match address {
                    Some(address) => address.row,
                    None => cursor.row_index(binding)?,
                };
                return visitor.visit_row_number(binding, row + 1, out);
            }
            ValueType::ColumnNumber => {
                let col = match address {
                    Some(address) => address.col,
                    None => cursor.column_index(binding)?,
                };
                return visitor.visit_column_number(binding, col + 1, out);
            }
            ValueType::Constant(None) => return visitor.visit_null(binding, out),
            ValueType::Constant(Some(literal)) => {
                return visitor.visit_string(binding, literal, out);
            }
            _ => {}
        }

        let cell = match address {
            Some(address) => {
                let sheet = self.sheet_of(address, cursor)?;
                CellHandle::at(sheet, address.row, address.col)
            }
            None => cursor.cell(binding)?,
        };
        let Some(cell) = cell else {
            return visitor.visit_null(binding, out);
        };

        match &binding.value_type {
            ValueType::CellValue | ValueType::CellFormula => {
                visit_cell_value(binding, &cell, visitor, out)
            }
            ValueType::CellStyle(attr) => {
                visit_cell_style(binding, &cell, attr.as_deref(), visitor, out)
            }
            ValueType::CellFont(attr) => {
                visit_cell_font(binding, &cell, attr.as_deref(), visitor, out)
            }
            ValueType::CellComment(attr) => {
                visit_cell_comment(binding, &cell, attr.as_deref(), visitor, out)
            }
            ValueType::CellType => visit_cell_type(binding, cell.data().cell_type(), visitor, out),
            ValueType::CellCachedType => {
                let data = cell.data();
                let cell_type = match data.cell_type() {
                    CellType::Formula => data.cached_type(),
                    other => other,
                };
                visit_cell_type(binding, cell_type, visitor, out)
            }
            other => Err(ParseError::UnsupportedConfiguration(format!(
                "unsupported value_type={other}"
            ))),
        }
    }

    fn sheet_of(
        &self,
        address: &CellRef,
        cursor: &dyn RecordCursor<'a>,
    ) -> Result<&'a SheetData, ParseError> {
        match address.sheet() {
            None => Ok(cursor.sheet()),
            Some(name) => self
                .workbook
                .sheet(name)
                .ok_or_else(|| ParseError::SheetNotFound(name.to_string())),
        }
    }
}

fn located(address: &CellRef, active_sheet: &str) -> CellRef {
    match address.sheet() {
        Some(_) => address.clone(),
        None => address.clone().with_sheet(active_sheet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::SheetBindings;
    use crate::config::{ColumnConfig, ParserConfig};
    use crate::record::RowRecord;
    use crate::schema::ColumnType;
    use crate::sink::{RowBuffer, Value};
    use crate::timestamp::TimestampParserTable;
    use sheetfeed_common::{CellValue, DateSystem};
    use sheetfeed_io::CellData;

    fn workbook() -> WorkbookData {
        let mut data = SheetData::new("Data");
        data.insert(0, 0, CellData::from_value(1.5));
        data.insert(0, 1, CellData::from_formula("A1*2", CellValue::Numeric(3.0)));
        data.insert(0, 2, CellData::from_value(true));
        let mut other = SheetData::new("Other");
        other.insert(4, 3, CellData::from_value("far"));
        WorkbookData {
            sheets: vec![data, other],
        }
    }

    fn run(columns: Vec<ColumnConfig>) -> Result<Vec<Value>, ParseError> {
        let wb = workbook();
        let config = ParserConfig::new(vec!["Data".into()], columns);
        let bindings = SheetBindings::bind(&config, "Data")?;
        let table = TimestampParserTable::build(&config)?;
        let adapters = AdapterSet::new(&table, DateSystem::Excel1900);
        let visitor = ColumnVisitor::new(&wb, Some("book.json"), &adapters);
        let sheet = wb.sheet("Data").unwrap();
        let cursor = RowRecord::new(sheet, 0);
        let mut buf = RowBuffer::new(bindings.columns().len());
        for binding in bindings.columns() {
            visitor.visit(binding, &cursor, &mut buf)?;
        }
        Ok(buf.take())
    }

    #[test]
    fn metadata_sources() {
        let values = run(vec![
            ColumnConfig::new("file", ColumnType::String).with_value("file_name"),
            ColumnConfig::new("sheet", ColumnType::String).with_value("sheet_name"),
            ColumnConfig::new("row", ColumnType::Long).with_value("row_number"),
            ColumnConfig::new("n", ColumnType::Long).with_value("constant"),
            ColumnConfig::new("k", ColumnType::String).with_value("constant.N/A"),
        ])
        .unwrap();
        assert_eq!(
            values,
            vec![
                Value::String("book.json".into()),
                Value::String("Data".into()),
                Value::Long(1),
                Value::Null,
                Value::String("N/A".into()),
            ]
        );
    }

    #[test]
    fn cell_sources_walk_the_row() {
        let values = run(vec![
            ColumnConfig::new("a", ColumnType::Double),
            ColumnConfig::new("b", ColumnType::Double),
            ColumnConfig::new("b_type", ColumnType::String)
                .with_value("cell_type")
                .with_column_number("="),
            ColumnConfig::new("b_cached", ColumnType::String)
                .with_value("cell_cached_type")
                .with_column_number("="),
            ColumnConfig::new("c_col", ColumnType::Long)
                .with_value("column_number")
                .with_column_number("+"),
            ColumnConfig::new("missing", ColumnType::String).with_column_number("Z"),
        ])
        .unwrap();
        assert_eq!(
            values,
            vec![
                Value::Double(1.5),
                Value::Double(3.0),
                Value::String("FORMULA".into()),
                Value::String("NUMERIC".into()),
                Value::Long(3),
                Value::Null,
            ]
        );
    }

    #[test]
    fn fixed_address_on_another_sheet() {
        let values = run(vec![
            ColumnConfig::new("far", ColumnType::String).with_cell_address("Other!D5"),
            ColumnConfig::new("far_sheet", ColumnType::String)
                .with_value("sheet_name")
                .with_cell_address("Other!D5"),
            ColumnConfig::new("far_row", ColumnType::Long)
                .with_value("row_number")
                .with_cell_address("Other!D5"),
        ])
        .unwrap();
        assert_eq!(
            values,
            vec![
                Value::String("far".into()),
                Value::String("Other".into()),
                Value::Long(5),
            ]
        );

        let err = run(vec![
            ColumnConfig::new("gone", ColumnType::String).with_cell_address("Nope!A1"),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "error at gone(string) cell=Nope!A1. not found sheet=Nope"
        );
    }

    #[test]
    fn failures_carry_cell_location() {
        let err = run(vec![
            ColumnConfig::new("a", ColumnType::Double),
            ColumnConfig::new("b", ColumnType::Double),
            ColumnConfig::new("flag", ColumnType::Timestamp),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "error at flag(timestamp) cell=Data!C1. unsupported conversion boolean(true) to timestamp"
        );
        assert!(matches!(err.root_cause(), ParseError::Conversion(_)));
    }
}
