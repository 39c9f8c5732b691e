use sheetfeed_common::{A1ParseError, CellRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("{backend} error: {message}")]
    Backend { backend: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported workbook format `{0}`")]
    UnsupportedFormat(String),

    #[error("sheet `{0}` not found")]
    SheetNotFound(String),

    #[error("invalid cell reference: {0}")]
    Reference(#[from] A1ParseError),

    #[error("{message} at {cell}")]
    Cell { cell: String, message: String },
}

impl IoError {
    pub fn from_backend<E: std::error::Error>(backend: &str, err: E) -> Self {
        IoError::Backend {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }
}

/// Attach `Sheet!A1` context to a message coming out of a backend.
pub fn with_cell_context(sheet: &str, row: u32, col: u32, message: impl Into<String>) -> IoError {
    IoError::Cell {
        cell: CellRef::new(row, col).with_sheet(sheet).to_string(),
        message: message.into(),
    }
}
