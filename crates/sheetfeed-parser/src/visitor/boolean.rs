use super::{CellVisitor, parse_bool};
use crate::binding::ColumnBinding;
use crate::error::ParseError;
use crate::sink::RowWriter;
use sheetfeed_common::ExcelErrorKind;

const TARGET: &str = "boolean";

pub struct BooleanCellVisitor;

impl CellVisitor for BooleanCellVisitor {
    fn visit_numeric(
        &self,
        binding: &ColumnBinding,
        value: f64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_boolean(&binding.column, value != 0.0);
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
        match parse_bool(value) {
            Some(b) => {
                out.set_boolean(&binding.column, b);
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
        out.set_boolean(&binding.column, value);
        Ok(())
    }

    fn visit_error(
        &self,
        binding: &ColumnBinding,
        code: ExcelErrorKind,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.convert_error(
            binding,
            ParseError::unsupported_conversion("error_code", code, TARGET),
            out,
        )
    }

    fn visit_long(
        &self,
        binding: &ColumnBinding,
        value: i64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_boolean(&binding.column, value != 0);
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
        self.convert_error(
            binding,
            ParseError::unsupported_conversion("row_number", number, TARGET),
            out,
        )
    }

    fn visit_column_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.convert_error(
            binding,
            ParseError::unsupported_conversion("column_number", number, TARGET),
            out,
        )
    }

    fn convert_error_constant(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        let b = parse_bool(value).ok_or_else(|| {
            ParseError::Conversion(format!("cannot convert `{value}` to {TARGET}"))
        })?;
        out.set_boolean(&binding.column, b);
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
    fn numeric_and_text_sources() {
        let b = binding(ColumnType::Boolean);
        let mut buf = RowBuffer::new(1);
        BooleanCellVisitor.visit_numeric(&b, 0.5, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Boolean(true));
        BooleanCellVisitor.visit_string(&b, "no", &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Boolean(false));
        BooleanCellVisitor.visit_string(&b, "", &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Null);
    }

    #[test]
    fn unsupported_sources_follow_strategy() {
        let mut buf = RowBuffer::new(1);
        let strict = binding(ColumnType::Boolean);
        let err = BooleanCellVisitor
            .visit_sheet_name(&strict, "Data", &mut buf)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported conversion sheet_name(Data) to boolean"
        );

        let fallback = with_convert_error(ColumnType::Boolean, "constant.true");
        BooleanCellVisitor
            .visit_string(&fallback, "maybe", &mut buf)
            .unwrap();
        assert_eq!(single(&buf), Value::Boolean(true));

        let broken = with_convert_error(ColumnType::Boolean, "constant.perhaps");
        let err = BooleanCellVisitor
            .visit_error(&broken, ExcelErrorKind::Na, &mut buf)
            .unwrap_err();
        assert!(matches!(err, ParseError::ConstantFallback { .. }), "{err}");
    }
}
