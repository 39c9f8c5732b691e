//! Typed record streams from spreadsheet workbooks.
//!
//! A [`ParserConfig`] names the sheets to read and declares output columns.
//! Each column is bound to a source (a cell under the record cursor, a fixed
//! address, sheet or file metadata, a constant) and an output type. A
//! [`FileSession`] walks the selected sheets and writes one record per row,
//! column or sheet into a [`RecordSink`].
//!
//! ```no_run
//! use sheetfeed_parser::{FileSession, ParserConfig, RecordBatch};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ParserConfig::from_yaml_str(
//!     "sheets: [Data]\nskip_header_lines: 1\ncolumns:\n  - { name: id, type: long }\n",
//! )?;
//! let workbook = sheetfeed_io::load_workbook("book.xlsx")?;
//! let session = FileSession::new(&config, &workbook, Some("book.xlsx".into()))?;
//! let mut batch = RecordBatch::new(session.schema().clone());
//! session.run(&mut batch)?;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod record;
pub mod schema;
pub mod session;
pub mod sink;
pub mod timestamp;
pub mod visitor;

pub use binding::{ColumnBinding, SheetBindings, ValueType};
pub use config::{ColumnConfig, ErrorStrategy, ParserConfig, PositionSpec, RecordType, SheetOption};
pub use error::ParseError;
pub use record::{CellHandle, RecordCursor, cursor_for};
pub use schema::{Column, ColumnType, Schema};
pub use session::{FileSession, SessionStats};
pub use sink::{RecordBatch, RecordSink, RowBuffer, RowWriter, Value};
pub use timestamp::{TimeZoneSpec, TimestampFormatter, TimestampInfo, TimestampParserTable};
pub use visitor::{AdapterSet, CellVisitor, ColumnVisitor};
