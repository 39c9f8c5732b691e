use super::CellVisitor;
use crate::binding::ColumnBinding;
use crate::error::ParseError;
use crate::sink::RowWriter;
use sheetfeed_common::ExcelErrorKind;

pub struct StringCellVisitor;

// Integral numbers print without a fraction (`12`, not `12.0`)
fn format_numeric(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl CellVisitor for StringCellVisitor {
    fn visit_numeric(
        &self,
        binding: &ColumnBinding,
        value: f64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, &format_numeric(value));
        Ok(())
    }

    fn visit_string(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, value);
        Ok(())
    }

    fn visit_boolean(
        &self,
        binding: &ColumnBinding,
        value: bool,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, if value { "true" } else { "false" });
        Ok(())
    }

    fn visit_error(
        &self,
        binding: &ColumnBinding,
        code: ExcelErrorKind,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, code.label());
        Ok(())
    }

    fn visit_long(
        &self,
        binding: &ColumnBinding,
        value: i64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, &value.to_string());
        Ok(())
    }

    fn visit_sheet_name(
        &self,
        binding: &ColumnBinding,
        name: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, name);
        Ok(())
    }

    fn visit_row_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, &number.to_string());
        Ok(())
    }

    fn visit_column_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, &number.to_string());
        Ok(())
    }

    fn convert_error_constant(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_string(&binding.column, value);
        Ok(())
    }
}
