use super::CellVisitor;
use crate::binding::ColumnBinding;
use crate::error::ParseError;
use crate::sink::RowWriter;
use sheetfeed_common::ExcelErrorKind;

const TARGET: &str = "double";

pub struct DoubleCellVisitor;

fn parse_double(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

impl CellVisitor for DoubleCellVisitor {
    fn visit_numeric(
        &self,
        binding: &ColumnBinding,
        value: f64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_double(&binding.column, value);
        Ok(())
    }

    fn visit_string(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        if value.is_empty() {
            return self.visit_null(binding, out);
        }
        match parse_double(value) {
            Some(v) => {
                out.set_double(&binding.column, v);
                Ok(())
            }
            None => self.convert_error(
                binding,
                ParseError::unsupported_conversion("string", value, TARGET),
                out,
            ),
        }
    }

    fn visit_boolean(
        &self,
        binding: &ColumnBinding,
        value: bool,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_double(&binding.column, if value { 1.0 } else { 0.0 });
        Ok(())
    }

    fn visit_error(
        &self,
        binding: &ColumnBinding,
        code: ExcelErrorKind,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_double(&binding.column, f64::from(code.code()));
        Ok(())
    }

    fn visit_long(
        &self,
        binding: &ColumnBinding,
        value: i64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_double(&binding.column, value as f64);
        Ok(())
    }

    fn visit_sheet_name(
        &self,
        binding: &ColumnBinding,
        name: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.convert_error(
            binding,
            ParseError::unsupported_conversion("sheet_name", name, TARGET),
            out,
        )
    }

    fn visit_row_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_double(&binding.column, f64::from(number));
        Ok(())
    }

    fn visit_column_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_double(&binding.column, f64::from(number));
        Ok(())
    }

    fn convert_error_constant(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        let v = parse_double(value).ok_or_else(|| {
            ParseError::Conversion(format!("cannot convert `{value}` to {TARGET}"))
        })?;
        out.set_double(&binding.column, v);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::sink::{RowBuffer, Value};
    use crate::visitor::test_support::{binding, single, with_convert_error};

    #[test]
    fn sources_into_double() {
        let b = binding(ColumnType::Double);
        let mut buf = RowBuffer::new(1);
        DoubleCellVisitor.visit_string(&b, " 2.5 ", &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Double(2.5));
        DoubleCellVisitor.visit_long(&b, 4, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Double(4.0));
        DoubleCellVisitor
            .visit_column_number(&b, 2, &mut buf)
            .unwrap();
        assert_eq!(single(&buf), Value::Double(2.0));
    }

    #[test]
    fn constant_fallback_substitutes() {
        let b = with_convert_error(ColumnType::Double, "constant.-1");
        let mut buf = RowBuffer::new(1);
        DoubleCellVisitor
            .visit_sheet_name(&b, "Data", &mut buf)
            .unwrap();
        assert_eq!(single(&buf), Value::Double(-1.0));
    }
}
