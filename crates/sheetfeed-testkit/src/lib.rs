//! Workbook fixtures written to a temporary directory that lives as long as
//! the returned [`Fixture`].

use std::ops::Deref;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::Spreadsheet;

pub struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for Fixture {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for Fixture {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Build an xlsx file starting from umya's default book (one `Sheet1`).
pub fn build_workbook<F>(f: F) -> Fixture
where
    F: FnOnce(&mut Spreadsheet),
{
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("fixture.xlsx");
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write xlsx fixture");
    Fixture { _dir: dir, path }
}

/// Write a JSON workbook document to `book.json`.
pub fn json_workbook(json: &str) -> Fixture {
    write_file("book.json", json.as_bytes())
}

/// Write arbitrary bytes under `name` in a fresh temporary directory.
pub fn write_file(name: &str, contents: &[u8]) -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    Fixture { _dir: dir, path }
}
