//! Parser configuration, read from YAML or JSON.
//!
//! ```yaml
//! sheets: ["Data", "Report*"]
//! skip_header_lines: 1
//! default_timezone: "Asia/Tokyo"
//! columns:
//!   - { name: id,      type: long }
//!   - { name: born,    type: timestamp, format: "%Y/%m/%d" }
//!   - { name: sheet,   type: string, value: sheet_name }
//!   - { name: title,   type: string, cell_address: "Summary!B1" }
//!   - { name: note,    type: string, value: cell_comment, column_number: "=" }
//! sheet_options:
//!   Summary: { record_type: sheet }
//! ```

use crate::error::ParseError;
use crate::schema::{Column, ColumnType, Schema};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";
pub const DEFAULT_DATE: &str = "1970-01-01";

/// How a sheet is turned into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// One record per physical row.
    #[default]
    Row,
    /// One record per physical column.
    Column,
    /// A single record for the whole sheet.
    Sheet,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordType::Row => "row",
            RecordType::Column => "column",
            RecordType::Sheet => "sheet",
        })
    }
}

/// Reaction to error cells (`on_cell_error`) and to failed conversions
/// (`on_convert_error`). An unquoted YAML `null` reads as [`ErrorStrategy::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ErrorStrategy {
    Null,
    Exception,
    /// Forward the numeric error code to the adapter.
    ErrorCode,
    /// `constant` writes null, `constant.<value>` substitutes `<value>`.
    Constant(Option<String>),
}

impl ErrorStrategy {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let (head, suffix) = match s.split_once('.') {
            Some((head, suffix)) => (head, Some(suffix)),
            None => (s, None),
        };
        match (head, suffix) {
            ("null", None) => Ok(ErrorStrategy::Null),
            ("exception", None) => Ok(ErrorStrategy::Exception),
            ("error_code", None) => Ok(ErrorStrategy::ErrorCode),
            ("constant", suffix) => Ok(ErrorStrategy::Constant(suffix.map(str::to_string))),
            _ => Err(ParseError::Config(format!("illegal error strategy `{s}`"))),
        }
    }
}

impl<'de> Deserialize<'de> for ErrorStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StrategyVisitor;

        impl<'de> Visitor<'de> for StrategyVisitor {
            type Value = ErrorStrategy;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an error strategy name or null")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                ErrorStrategy::parse(v).map_err(E::custom)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ErrorStrategy::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ErrorStrategy::Null)
            }
        }

        deserializer.deserialize_any(StrategyVisitor)
    }
}

// A present key always sets the strategy, even when its value is `null`.
fn present_strategy<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ErrorStrategy>, D::Error> {
    ErrorStrategy::deserialize(deserializer).map(Some)
}

impl From<ErrorStrategy> for String {
    fn from(value: ErrorStrategy) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ErrorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStrategy::Null => f.write_str("null"),
            ErrorStrategy::Exception => f.write_str("exception"),
            ErrorStrategy::ErrorCode => f.write_str("error_code"),
            ErrorStrategy::Constant(None) => f.write_str("constant"),
            ErrorStrategy::Constant(Some(v)) => write!(f, "constant.{v}"),
        }
    }
}

/// `column_number` / `row_number` option; YAML may give either `3` or `"C"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionSpec {
    Number(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Value type string, `cell_value` when omitted.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub cell_address: Option<String>,
    #[serde(default)]
    pub column_number: Option<PositionSpec>,
    #[serde(default)]
    pub row_number: Option<PositionSpec>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub search_merged_cell: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present_strategy",
        skip_serializing_if = "Option::is_none"
    )]
    pub on_cell_error: Option<ErrorStrategy>,
    #[serde(
        default,
        deserialize_with = "present_strategy",
        skip_serializing_if = "Option::is_none"
    )]
    pub on_convert_error: Option<ErrorStrategy>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            value: None,
            cell_address: None,
            column_number: None,
            row_number: None,
            format: None,
            timezone: None,
            date: None,
            search_merged_cell: None,
            on_cell_error: None,
            on_convert_error: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_cell_address(mut self, address: impl Into<String>) -> Self {
        self.cell_address = Some(address.into());
        self
    }

    pub fn with_column_number(mut self, position: impl Into<String>) -> Self {
        self.column_number = Some(PositionSpec::Text(position.into()));
        self
    }

    pub fn with_row_number(mut self, position: impl Into<String>) -> Self {
        self.row_number = Some(PositionSpec::Text(position.into()));
        self
    }
}

/// Per-sheet overrides, keyed by sheet name in `sheet_options`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetOption {
    #[serde(default)]
    pub record_type: Option<RecordType>,
    #[serde(default)]
    pub skip_header_lines: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// Sheet names or glob patterns, processed in order.
    pub sheets: Vec<String>,
    #[serde(default)]
    pub record_type: RecordType,
    #[serde(default)]
    pub skip_header_lines: u32,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_timestamp_format")]
    pub default_timestamp_format: String,
    #[serde(default = "default_date")]
    pub default_date: String,
    #[serde(default = "default_true")]
    pub search_merged_cell: bool,
    #[serde(default = "default_on_cell_error")]
    pub on_cell_error: ErrorStrategy,
    #[serde(default = "default_on_convert_error")]
    pub on_convert_error: ErrorStrategy,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub sheet_options: BTreeMap<String, SheetOption>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn default_date() -> String {
    DEFAULT_DATE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_on_cell_error() -> ErrorStrategy {
    ErrorStrategy::Constant(None)
}

fn default_on_convert_error() -> ErrorStrategy {
    ErrorStrategy::Exception
}

impl ParserConfig {
    pub fn new(sheets: Vec<String>, columns: Vec<ColumnConfig>) -> Self {
        Self {
            sheets,
            record_type: RecordType::default(),
            skip_header_lines: 0,
            default_timezone: default_timezone(),
            default_timestamp_format: default_timestamp_format(),
            default_date: default_date(),
            search_merged_cell: true,
            on_cell_error: default_on_cell_error(),
            on_convert_error: default_on_convert_error(),
            columns,
            sheet_options: BTreeMap::new(),
        }
    }

    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Output schema in declaration order.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .enumerate()
                .map(|(index, c)| Column {
                    index,
                    name: c.name.clone(),
                    column_type: c.column_type,
                })
                .collect(),
        )
    }

    /// Effective record type and header skip for `sheet`.
    pub fn sheet_settings(&self, sheet: &str) -> (RecordType, u32) {
        let option = self.sheet_options.get(sheet);
        (
            option
                .and_then(|o| o.record_type)
                .unwrap_or(self.record_type),
            option
                .and_then(|o| o.skip_header_lines)
                .unwrap_or(self.skip_header_lines),
        )
    }

    /// Structural checks that do not need a workbook. Value types, addresses
    /// and timestamp settings are checked when bound.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.sheets.is_empty() {
            return Err(ParseError::Config("`sheets` must not be empty".into()));
        }
        if self.columns.is_empty() {
            return Err(ParseError::Config("`columns` must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(ParseError::Config("column name must not be empty".into()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ParseError::Config(format!(
                    "duplicate column name `{}`",
                    column.name
                )));
            }
            let on_convert = column
                .on_convert_error
                .as_ref()
                .unwrap_or(&self.on_convert_error);
            if *on_convert == ErrorStrategy::ErrorCode {
                return Err(ParseError::Config(format!(
                    "on_convert_error=error_code is not supported (column {})",
                    column.name
                )));
            }
        }
        if self.on_convert_error == ErrorStrategy::ErrorCode {
            return Err(ParseError::Config(
                "on_convert_error=error_code is not supported".into(),
            ));
        }
        Ok(())
    }
}
