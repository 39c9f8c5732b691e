//! One pass over the configured sheets of a loaded workbook.

use crate::binding::SheetBindings;
use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::record::cursor_for;
use crate::schema::Schema;
use crate::sink::{RecordSink, RowBuffer};
use crate::timestamp::TimestampParserTable;
use crate::visitor::{AdapterSet, ColumnVisitor};
use globset::Glob;
use sheetfeed_io::{SheetData, WorkbookData};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub sheets: usize,
    pub records: u64,
}

/// Parser state for a single workbook file.
///
/// The timestamp table is built once here and only read while records are
/// produced. The file name is the hint written by `file_name` columns.
pub struct FileSession<'a> {
    config: &'a ParserConfig,
    workbook: &'a WorkbookData,
    file_name: Option<String>,
    timestamps: TimestampParserTable,
    schema: Schema,
}

impl<'a> FileSession<'a> {
    pub fn new(
        config: &'a ParserConfig,
        workbook: &'a WorkbookData,
        file_name: Option<String>,
    ) -> Result<Self, ParseError> {
        config.validate()?;
        Ok(Self {
            config,
            workbook,
            file_name,
            timestamps: TimestampParserTable::build(config)?,
            schema: config.schema(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Sheets selected by `config.sheets`, in configuration order.
    ///
    /// Entries with glob metacharacters match any number of sheets (in
    /// workbook order); a plain name must exist. A sheet selected twice is
    /// read once.
    pub fn resolve_sheets(&self) -> Result<Vec<&'a SheetData>, ParseError> {
        let mut selected = Vec::new();
        let mut seen = HashSet::new();
        for pattern in &self.config.sheets {
            if !is_glob(pattern) {
                let sheet = self
                    .workbook
                    .sheet(pattern)
                    .ok_or_else(|| ParseError::SheetNotFound(pattern.clone()))?;
                if seen.insert(sheet.name()) {
                    selected.push(sheet);
                }
                continue;
            }
            let matcher = Glob::new(pattern)
                .map_err(|e| ParseError::Config(format!("sheet pattern `{pattern}`: {e}")))?
                .compile_matcher();
            for sheet in self.workbook.sheets() {
                if matcher.is_match(sheet.name()) && seen.insert(sheet.name()) {
                    selected.push(sheet);
                }
            }
        }
        Ok(selected)
    }

    /// Parse every selected sheet into `sink`.
    pub fn run(&self, sink: &mut dyn RecordSink) -> Result<SessionStats, ParseError> {
        let mut stats = SessionStats::default();
        for sheet in self.resolve_sheets()? {
            stats.records += self.parse_sheet(sheet, sink)?;
            stats.sheets += 1;
        }
        Ok(stats)
    }

    /// Parse one sheet. Records reach `sink` only once every column of the
    /// record has been written.
    pub fn parse_sheet(
        &self,
        sheet: &'a SheetData,
        sink: &mut dyn RecordSink,
    ) -> Result<u64, ParseError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(sheet = sheet.name(), "sheet start");

        let bindings = SheetBindings::bind(self.config, sheet.name())?;
        let adapters = AdapterSet::new(&self.timestamps, sheet.date_system);
        let visitor = ColumnVisitor::new(self.workbook, self.file_name.as_deref(), &adapters);
        let mut cursor = cursor_for(sheet, &bindings);
        let mut row = RowBuffer::new(self.schema.len());
        let mut records = 0u64;

        while cursor.exists() {
            for binding in bindings.columns() {
                visitor.visit(binding, cursor.as_ref(), &mut row)?;
            }
            sink.add_record(row.take());
            records += 1;
            cursor.move_next();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(sheet = sheet.name(), records, "sheet end");
        Ok(records)
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}
