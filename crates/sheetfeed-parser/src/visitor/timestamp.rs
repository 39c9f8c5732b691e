use super::CellVisitor;
use crate::binding::ColumnBinding;
use crate::error::ParseError;
use crate::sink::RowWriter;
use crate::timestamp::{TimestampInfo, TimestampParserTable};
use chrono::DateTime;
use sheetfeed_common::{DateSystem, ExcelErrorKind};

const TARGET: &str = "timestamp";

/// Timestamp adapter. Numeric cells are date serials, integral values are
/// epoch milliseconds and text goes through the column's format.
pub struct TimestampCellVisitor<'a> {
    table: &'a TimestampParserTable,
    date_system: DateSystem,
}

impl<'a> TimestampCellVisitor<'a> {
    pub fn new(table: &'a TimestampParserTable, date_system: DateSystem) -> Self {
        Self { table, date_system }
    }

    fn info(&self, binding: &ColumnBinding) -> Result<&'a TimestampInfo, ParseError> {
        self.table.get(binding.column.index).ok_or_else(|| {
            ParseError::UnsupportedConfiguration(format!(
                "no timestamp settings for column {}",
                binding.column
            ))
        })
    }

    fn unsupported(
        &self,
        binding: &ColumnBinding,
        source: &str,
        value: impl std::fmt::Display,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.convert_error(
            binding,
            ParseError::unsupported_conversion(source, value, TARGET),
            out,
        )
    }
}

impl CellVisitor for TimestampCellVisitor<'_> {
    fn visit_numeric(
        &self,
        binding: &ColumnBinding,
        value: f64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        match self.info(binding)?.from_serial(value, self.date_system) {
            Ok(ts) => {
                out.set_timestamp(&binding.column, ts);
                Ok(())
            }
            Err(err) => self.convert_error(binding, err, out),
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
        match self.info(binding)?.parse(value) {
            Ok(ts) => {
                out.set_timestamp(&binding.column, ts);
                Ok(())
            }
            Err(err) => self.convert_error(binding, err, out),
        }
    }

    fn visit_boolean(
        &self,
        binding: &ColumnBinding,
        value: bool,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.unsupported(binding, "boolean", value, out)
    }

    fn visit_error(
        &self,
        binding: &ColumnBinding,
        code: ExcelErrorKind,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.unsupported(binding, "error_code", code, out)
    }

    fn visit_long(
        &self,
        binding: &ColumnBinding,
        value: i64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        match DateTime::from_timestamp_millis(value) {
            Some(ts) => {
                out.set_timestamp(&binding.column, ts);
                Ok(())
            }
            None => self.unsupported(binding, "long", value, out),
        }
    }

    fn visit_sheet_name(
        &self,
        binding: &ColumnBinding,
        name: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.unsupported(binding, "sheet_name", name, out)
    }

    fn visit_row_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.unsupported(binding, "row_number", number, out)
    }

    fn visit_column_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        self.unsupported(binding, "column_number", number, out)
    }

    fn convert_error_constant(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        let ts = self.info(binding)?.parse(value)?;
        out.set_timestamp(&binding.column, ts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, ParserConfig};
    use crate::schema::ColumnType;
    use crate::sink::{RowBuffer, Value};
    use crate::visitor::test_support::{binding, single, with_convert_error};

    fn table(format: &str) -> TimestampParserTable {
        let mut column = ColumnConfig::new("c", ColumnType::Timestamp);
        column.format = Some(format.into());
        let config = ParserConfig::new(vec!["Data".into()], vec![column]);
        TimestampParserTable::build(&config).unwrap()
    }

    fn rendered(buf: &RowBuffer) -> String {
        single(buf).to_string()
    }

    #[test]
    fn serials_and_millis() {
        let t = table("%Y-%m-%d");
        let v = TimestampCellVisitor::new(&t, DateSystem::Excel1900);
        let b = binding(ColumnType::Timestamp);
        let mut buf = RowBuffer::new(1);
        v.visit_numeric(&b, 44000.5, &mut buf).unwrap();
        assert_eq!(rendered(&buf), "2020-06-18T12:00:00Z");
        v.visit_long(&b, 1_609_459_200_000, &mut buf).unwrap();
        assert_eq!(rendered(&buf), "2021-01-01T00:00:00Z");
    }

    #[test]
    fn text_uses_column_format() {
        let t = table("%Y/%m/%d");
        let v = TimestampCellVisitor::new(&t, DateSystem::Excel1900);
        let b = binding(ColumnType::Timestamp);
        let mut buf = RowBuffer::new(1);
        v.visit_string(&b, "2021/03/04", &mut buf).unwrap();
        assert_eq!(rendered(&buf), "2021-03-04T00:00:00Z");
        v.visit_string(&b, "", &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Null);
        let err = v.visit_string(&b, "soon", &mut buf).unwrap_err();
        assert!(matches!(err, ParseError::TimestampParse { .. }), "{err}");
    }

    #[test]
    fn boolean_is_rejected_unless_strategy_allows() {
        let t = table("%Y-%m-%d");
        let v = TimestampCellVisitor::new(&t, DateSystem::Excel1900);
        let mut buf = RowBuffer::new(1);
        let err = v
            .visit_boolean(&binding(ColumnType::Timestamp), true, &mut buf)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported conversion boolean(true) to timestamp"
        );

        let fallback = with_convert_error(ColumnType::Timestamp, "constant.2000-01-01");
        v.visit_boolean(&fallback, true, &mut buf).unwrap();
        assert_eq!(rendered(&buf), "2000-01-01T00:00:00Z");
    }

    #[test]
    fn missing_settings_is_a_configuration_error() {
        let empty = TimestampParserTable::default();
        let v = TimestampCellVisitor::new(&empty, DateSystem::Excel1900);
        let mut buf = RowBuffer::new(1);
        let err = v
            .visit_numeric(&binding(ColumnType::Timestamp), 1.0, &mut buf)
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedConfiguration(_)));
    }
}
