use super::{CellVisitor, parse_long, truncate_to_long};
use crate::binding::ColumnBinding;
use crate::error::ParseError;
use crate::sink::RowWriter;
use sheetfeed_common::ExcelErrorKind;

const TARGET: &str = "long";

pub struct LongCellVisitor;

impl CellVisitor for LongCellVisitor {
    fn visit_numeric(
        &self,
        binding: &ColumnBinding,
        value: f64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        match truncate_to_long(value) {
            Some(v) => {
                out.set_long(&binding.column, v);
                Ok(())
            }
            None => self.convert_error(
                binding,
                ParseError::unsupported_conversion("numeric", value, TARGET),
                out,
            ),
        }
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
        match parse_long(value) {
            Some(v) => {
                out.set_long(&binding.column, v);
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
        out.set_long(&binding.column, i64::from(value));
        Ok(())
    }

    fn visit_error(
        &self,
        binding: &ColumnBinding,
        code: ExcelErrorKind,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_long(&binding.column, i64::from(code.code()));
        Ok(())
    }

    fn visit_long(
        &self,
        binding: &ColumnBinding,
        value: i64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_long(&binding.column, value);
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
        out.set_long(&binding.column, i64::from(number));
        Ok(())
    }

    fn visit_column_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_long(&binding.column, i64::from(number));
        Ok(())
    }

    fn convert_error_constant(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        let v = parse_long(value).ok_or_else(|| {
            ParseError::Conversion(format!("cannot convert `{value}` to {TARGET}"))
        })?;
        out.set_long(&binding.column, v);
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
    fn truncates_and_parses() {
        let b = binding(ColumnType::Long);
        let mut buf = RowBuffer::new(1);
        LongCellVisitor.visit_numeric(&b, -7.8, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Long(-7));
        LongCellVisitor.visit_string(&b, "12.9", &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Long(12));
        LongCellVisitor.visit_boolean(&b, true, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Long(1));
        LongCellVisitor
            .visit_error(&b, ExcelErrorKind::Div, &mut buf)
            .unwrap();
        assert_eq!(single(&buf), Value::Long(7));
        LongCellVisitor.visit_row_number(&b, 3, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Long(3));
    }

    #[test]
    fn bad_text_uses_null_strategy() {
        let mut buf = RowBuffer::new(1);
        let b = with_convert_error(ColumnType::Long, "null");
        buf.set_long(&b.column, 99);
        LongCellVisitor.visit_string(&b, "twelve", &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Null);

        let strict = binding(ColumnType::Long);
        assert!(matches!(
            LongCellVisitor.visit_string(&strict, "twelve", &mut buf),
            Err(ParseError::Conversion(_))
        ));
    }

    #[test]
    fn out_of_range_numbers_are_conversion_errors() {
        let strict = binding(ColumnType::Long);
        let mut buf = RowBuffer::new(1);
        for value in [1e19, -1e19, f64::MAX, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                LongCellVisitor.visit_numeric(&strict, value, &mut buf),
                Err(ParseError::Conversion(_))
            ));
        }
        assert!(matches!(
            LongCellVisitor.visit_string(&strict, "1e19", &mut buf),
            Err(ParseError::Conversion(_))
        ));

        let lenient = with_convert_error(ColumnType::Long, "null");
        buf.set_long(&lenient.column, 5);
        LongCellVisitor.visit_numeric(&lenient, 1e19, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Null);

        LongCellVisitor
            .visit_numeric(&strict, -9_223_372_036_854_775_808.0, &mut buf)
            .unwrap();
        assert_eq!(single(&buf), Value::Long(i64::MIN));
    }
}
