pub mod backends;
pub mod error;
pub mod loader;
pub mod traits;

#[cfg(feature = "calamine")]
pub use backends::CalamineAdapter;
#[cfg(feature = "json")]
pub use backends::JsonAdapter;
#[cfg(feature = "umya")]
pub use backends::UmyaAdapter;
pub use error::{IoError, with_cell_context};
pub use loader::{LoaderStats, WorkbookLoader, load_workbook};
pub use traits::{
    BackendCaps, CellComment, CellData, CellFont, CellStyle, MergedRange, SheetData,
    SpreadsheetReader, WorkbookData,
};

// Re-export for convenience
pub use sheetfeed_common::{CellType, CellValue, DateSystem};
