use crate::config::{ErrorStrategy, ParserConfig, PositionSpec, RecordType};
use crate::error::ParseError;
use crate::schema::Column;
use crate::visitor::metadata::{COMMENT_ATTRIBUTES, FONT_ATTRIBUTES, STYLE_ATTRIBUTES};
use sheetfeed_common::{CellRef, letters_to_column};
use std::fmt;

/// Where a column's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    FileName,
    SheetName,
    RowNumber,
    ColumnNumber,
    /// Literal payload; `None` writes null.
    Constant(Option<String>),
    CellValue,
    CellFormula,
    CellStyle(Option<String>),
    CellFont(Option<String>),
    CellComment(Option<String>),
    CellType,
    CellCachedType,
}

impl ValueType {
    /// Parse `cell_value`, `cell_style.number_format`, `constant.N/A`, ...
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let (head, suffix) = match s.split_once('.') {
            Some((head, suffix)) => (head, Some(suffix)),
            None => (s, None),
        };
        let attribute = |known: &[&str]| -> Result<Option<String>, ParseError> {
            match suffix {
                None => Ok(None),
                Some(name) if known.contains(&name) => Ok(Some(name.to_string())),
                Some(name) => Err(ParseError::Config(format!(
                    "unknown attribute `{name}` for value type {head}"
                ))),
            }
        };
        let plain = |value_type: ValueType| match suffix {
            None => Ok(value_type),
            Some(_) => Err(ParseError::Config(format!(
                "value type {head} does not take a suffix (`{s}`)"
            ))),
        };
        match head {
            "file_name" => plain(ValueType::FileName),
            "sheet_name" => plain(ValueType::SheetName),
            "row_number" => plain(ValueType::RowNumber),
            "column_number" => plain(ValueType::ColumnNumber),
            "constant" => Ok(ValueType::Constant(suffix.map(str::to_string))),
            "cell_value" => plain(ValueType::CellValue),
            "cell_formula" => plain(ValueType::CellFormula),
            "cell_style" => Ok(ValueType::CellStyle(attribute(STYLE_ATTRIBUTES)?)),
            "cell_font" => Ok(ValueType::CellFont(attribute(FONT_ATTRIBUTES)?)),
            "cell_comment" => Ok(ValueType::CellComment(attribute(COMMENT_ATTRIBUTES)?)),
            "cell_type" => plain(ValueType::CellType),
            "cell_cached_type" => plain(ValueType::CellCachedType),
            _ => Err(ParseError::Config(format!("illegal value type `{s}`"))),
        }
    }

    /// True for value types that read a cell.
    pub fn is_cell_based(&self) -> bool {
        matches!(
            self,
            ValueType::CellValue
                | ValueType::CellFormula
                | ValueType::CellStyle(_)
                | ValueType::CellFont(_)
                | ValueType::CellComment(_)
                | ValueType::CellType
                | ValueType::CellCachedType
        )
    }

    /// Text after the first `.`, if any.
    pub fn suffix(&self) -> Option<&str> {
        match self {
            ValueType::Constant(s)
            | ValueType::CellStyle(s)
            | ValueType::CellFont(s)
            | ValueType::CellComment(s) => s.as_deref(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::FileName => "file_name",
            ValueType::SheetName => "sheet_name",
            ValueType::RowNumber => "row_number",
            ValueType::ColumnNumber => "column_number",
            ValueType::Constant(_) => "constant",
            ValueType::CellValue => "cell_value",
            ValueType::CellFormula => "cell_formula",
            ValueType::CellStyle(_) => "cell_style",
            ValueType::CellFont(_) => "cell_font",
            ValueType::CellComment(_) => "cell_comment",
            ValueType::CellType => "cell_type",
            ValueType::CellCachedType => "cell_cached_type",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suffix() {
            Some(suffix) => write!(f, "{}.{suffix}", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// Fully resolved column description.
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    pub column: Column,
    pub value_type: ValueType,
    /// Fixed cell; when set the record cursor is not consulted for the cell.
    pub cell_address: Option<CellRef>,
    /// Zero-based column for row records, row for column records.
    pub cursor_index: u32,
    pub search_merged_cell: bool,
    pub on_cell_error: ErrorStrategy,
    pub on_convert_error: ErrorStrategy,
}

impl ColumnBinding {
    pub fn name(&self) -> &str {
        &self.column.name
    }
}

/// Bound columns of one sheet, in declaration order.
#[derive(Debug, Clone)]
pub struct SheetBindings {
    record_type: RecordType,
    skip_header_lines: u32,
    columns: Vec<ColumnBinding>,
}

impl SheetBindings {
    /// Validate and bind the configured columns for `sheet_name`, applying
    /// its `sheet_options`.
    pub fn bind(config: &ParserConfig, sheet_name: &str) -> Result<Self, ParseError> {
        let (record_type, skip_header_lines) = config.sheet_settings(sheet_name);
        let schema = config.schema();
        let mut columns = Vec::with_capacity(config.columns.len());
        let mut previous: Option<u32> = None;

        for (column, options) in schema.columns().iter().zip(&config.columns) {
            let in_column = |e: ParseError| match e {
                ParseError::Config(msg) => {
                    ParseError::Config(format!("column {}: {msg}", column.name))
                }
                other => other,
            };

            let value_type = ValueType::parse(options.value.as_deref().unwrap_or("cell_value"))
                .map_err(in_column)?;
            let cell_address = options
                .cell_address
                .as_deref()
                .map(CellRef::parse_a1)
                .transpose()
                .map_err(|e| in_column(ParseError::Config(e.to_string())))?;

            let position = match record_type {
                RecordType::Row => options.column_number.as_ref(),
                RecordType::Column => options.row_number.as_ref(),
                RecordType::Sheet => None,
            };
            let advances = position.is_some()
                || (value_type.is_cell_based() && cell_address.is_none());
            let cursor_index = if advances {
                let index = resolve_position(position, previous, record_type).map_err(in_column)?;
                previous = Some(index);
                index
            } else {
                previous.unwrap_or(0)
            };

            columns.push(ColumnBinding {
                column: column.clone(),
                value_type,
                cell_address,
                cursor_index,
                search_merged_cell: options
                    .search_merged_cell
                    .unwrap_or(config.search_merged_cell),
                on_cell_error: options
                    .on_cell_error
                    .clone()
                    .unwrap_or_else(|| config.on_cell_error.clone()),
                on_convert_error: options
                    .on_convert_error
                    .clone()
                    .unwrap_or_else(|| config.on_convert_error.clone()),
            });
        }

        Ok(Self {
            record_type,
            skip_header_lines,
            columns,
        })
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn skip_header_lines(&self) -> u32 {
        self.skip_header_lines
    }

    pub fn columns(&self) -> &[ColumnBinding] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&ColumnBinding> {
        self.columns.iter().find(|c| c.column.name == name)
    }
}

/// Resolve `column_number`/`row_number` against the previous cell column.
///
/// Absolute: `3` or `"3"` (1-based), or letters such as `"C"` for row
/// records. Relative: `"="` (same), `"+"`/`"+N"`, `"-N"`.
fn resolve_position(
    spec: Option<&PositionSpec>,
    previous: Option<u32>,
    record_type: RecordType,
) -> Result<u32, ParseError> {
    let next = previous.map_or(0, |p| p + 1);
    let text = match spec {
        None => return Ok(next),
        Some(PositionSpec::Number(n)) => return one_based(*n),
        Some(PositionSpec::Text(text)) => text.trim(),
    };

    let relative = |delta: i64| -> Result<u32, ParseError> {
        // with no previous column, `+1` lands on the first position
        let base = previous.map_or(-1, i64::from);
        u32::try_from(base + delta)
            .map_err(|_| ParseError::Config(format!("position `{text}` is before the first cell")))
    };

    if text == "=" {
        return Ok(previous.unwrap_or(0));
    }
    if text == "+" {
        return Ok(next);
    }
    if let Some(n) = text.strip_prefix('+') {
        return relative(parse_offset(text, n)?);
    }
    if let Some(n) = text.strip_prefix('-') {
        return relative(-parse_offset(text, n)?);
    }
    if let Ok(n) = text.parse::<u32>() {
        return one_based(n);
    }
    if record_type == RecordType::Row {
        if let Some(col) = letters_to_column(text) {
            return Ok(col);
        }
    }
    Err(ParseError::Config(format!("illegal position `{text}`")))
}

fn parse_offset(text: &str, digits: &str) -> Result<i64, ParseError> {
    digits
        .parse::<i64>()
        .map_err(|_| ParseError::Config(format!("illegal position `{text}`")))
}

fn one_based(n: u32) -> Result<u32, ParseError> {
    n.checked_sub(1)
        .ok_or_else(|| ParseError::Config("positions are 1-based".into()))
}
