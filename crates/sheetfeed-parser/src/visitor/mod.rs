//! Typed output adapters and the visitors that feed them.
//!
//! A [`CellVisitor`] is implemented once per output column type. The
//! [`ColumnVisitor`](column::ColumnVisitor) decides which source a column
//! reads and calls the matching `visit_*` method on the adapter for the
//! column's type.

mod boolean;
pub mod cell_value;
pub mod column;
mod double;
mod long;
pub mod metadata;
mod string;
mod timestamp;

pub use boolean::BooleanCellVisitor;
pub use column::ColumnVisitor;
pub use double::DoubleCellVisitor;
pub use long::LongCellVisitor;
pub use string::StringCellVisitor;
pub use timestamp::TimestampCellVisitor;

use crate::binding::ColumnBinding;
use crate::config::ErrorStrategy;
use crate::error::ParseError;
use crate::schema::ColumnType;
use crate::sink::RowWriter;
use crate::timestamp::TimestampParserTable;
use sheetfeed_common::{DateSystem, ExcelErrorKind};

pub trait CellVisitor {
    fn visit_numeric(
        &self,
        binding: &ColumnBinding,
        value: f64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    fn visit_string(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    fn visit_boolean(
        &self,
        binding: &ColumnBinding,
        value: bool,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    fn visit_error(
        &self,
        binding: &ColumnBinding,
        code: ExcelErrorKind,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    /// Raw integral value; timestamps read it as epoch milliseconds.
    fn visit_long(
        &self,
        binding: &ColumnBinding,
        value: i64,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    fn visit_sheet_name(
        &self,
        binding: &ColumnBinding,
        name: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    /// `number` is 1-based.
    fn visit_row_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    /// `number` is 1-based.
    fn visit_column_number(
        &self,
        binding: &ColumnBinding,
        number: u32,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    /// Convert the `constant.<value>` fallback of `on_convert_error`.
    fn convert_error_constant(
        &self,
        binding: &ColumnBinding,
        value: &str,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError>;

    fn visit_file_name(
        &self,
        binding: &ColumnBinding,
        name: Option<&str>,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        match name {
            Some(name) => self.visit_string(binding, name, out),
            None => self.visit_null(binding, out),
        }
    }

    fn visit_null(
        &self,
        binding: &ColumnBinding,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        out.set_null(&binding.column);
        Ok(())
    }

    /// Apply the column's `on_convert_error` strategy to `err`.
    fn convert_error(
        &self,
        binding: &ColumnBinding,
        err: ParseError,
        out: &mut dyn RowWriter,
    ) -> Result<(), ParseError> {
        match &binding.on_convert_error {
            ErrorStrategy::Null | ErrorStrategy::Constant(None) => self.visit_null(binding, out),
            ErrorStrategy::Constant(Some(value)) => self
                .convert_error_constant(binding, value, out)
                .map_err(|source| ParseError::ConstantFallback {
                    value: value.clone(),
                    source: Box::new(source),
                }),
            ErrorStrategy::Exception | ErrorStrategy::ErrorCode => Err(err),
        }
    }
}

/// One adapter per output type for the sheet being read.
pub struct AdapterSet<'a> {
    boolean: BooleanCellVisitor,
    long: LongCellVisitor,
    double: DoubleCellVisitor,
    string: StringCellVisitor,
    timestamp: TimestampCellVisitor<'a>,
}

impl<'a> AdapterSet<'a> {
    pub fn new(timestamps: &'a TimestampParserTable, date_system: DateSystem) -> Self {
        Self {
            boolean: BooleanCellVisitor,
            long: LongCellVisitor,
            double: DoubleCellVisitor,
            string: StringCellVisitor,
            timestamp: TimestampCellVisitor::new(timestamps, date_system),
        }
    }

    pub fn for_type(&self, column_type: ColumnType) -> &dyn CellVisitor {
        match column_type {
            ColumnType::Boolean => &self.boolean,
            ColumnType::Long => &self.long,
            ColumnType::Double => &self.double,
            ColumnType::String => &self.string,
            ColumnType::Timestamp => &self.timestamp,
        }
    }
}

/// Strict text-to-boolean reading shared by the boolean adapter.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// `i64` first, then `f64` truncated toward zero.
pub(crate) fn parse_long(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    s.parse::<f64>().ok().and_then(truncate_to_long)
}

/// Truncate toward zero; `None` when the result does not fit an `i64`.
pub(crate) fn truncate_to_long(value: f64) -> Option<i64> {
    // i64::MIN is exactly representable, i64::MAX rounds up to 2^63
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let t = value.trunc();
    (t >= -LIMIT && t < LIMIT).then_some(t as i64)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::binding::{ColumnBinding, ValueType};
    use crate::config::ErrorStrategy;
    use crate::schema::{Column, ColumnType};
    use crate::sink::{RowBuffer, Value};

    pub fn binding(column_type: ColumnType) -> ColumnBinding {
        ColumnBinding {
            column: Column {
                index: 0,
                name: "c".into(),
                column_type,
            },
            value_type: ValueType::CellValue,
            cell_address: None,
            cursor_index: 0,
            search_merged_cell: true,
            on_cell_error: ErrorStrategy::Constant(None),
            on_convert_error: ErrorStrategy::Exception,
        }
    }

    pub fn with_convert_error(column_type: ColumnType, strategy: &str) -> ColumnBinding {
        let mut b = binding(column_type);
        b.on_convert_error = ErrorStrategy::parse(strategy).unwrap();
        b
    }

    pub fn single(buf: &RowBuffer) -> Value {
        buf.get(0).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_parsers() {
        assert_eq!(parse_bool(" Yes "), Some(true));
        assert_eq!(parse_bool("OFF"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_long("42"), Some(42));
        assert_eq!(parse_long("-3.9"), Some(-3));
        assert_eq!(parse_long("1e3"), Some(1000));
        assert_eq!(parse_long("x"), None);
    }
}
