use sheetfeed_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Operation that the active record type or binding cannot serve.
    #[error("{0}")]
    UnsupportedConfiguration(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A source value the output adapter cannot represent.
    #[error("{0}")]
    Conversion(String),

    #[error("cannot parse `{value}` as timestamp with format `{format}`: {message}")]
    TimestampParse {
        value: String,
        format: String,
        message: String,
    },

    #[error("fallback constant `{value}` failed: {source}")]
    ConstantFallback {
        value: String,
        #[source]
        source: Box<ParseError>,
    },

    #[error("encount cell error. error_code={code}({label})")]
    CellError { code: i32, label: &'static str },

    /// Context wrapper attached by the column dispatcher.
    #[error("error at {column} {}. {source}", location(.sheet, .cell))]
    Column {
        column: String,
        sheet: String,
        cell: Option<String>,
        #[source]
        source: Box<ParseError>,
    },

    #[error("not found sheet={0}")]
    SheetNotFound(String),

    #[error(transparent)]
    Io(#[from] IoError),
}

fn location(sheet: &str, cell: &Option<String>) -> String {
    match cell {
        Some(cell) => format!("cell={cell}"),
        None => format!("sheet={sheet}"),
    }
}

impl ParseError {
    pub(crate) fn unsupported_conversion(
        source: &str,
        value: impl std::fmt::Display,
        target: &str,
    ) -> Self {
        ParseError::Conversion(format!(
            "unsupported conversion {source}({value}) to {target}"
        ))
    }

    /// Innermost error, skipping column and fallback wrappers.
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::Column { source, .. } | ParseError::ConstantFallback { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}
