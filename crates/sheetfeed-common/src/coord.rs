//! A1-style cell coordinates.
//!
//! `CellRef` stores zero-based row/column indices plus an optional sheet
//! name. `Display` renders the spreadsheet form (`Sheet1!B7`), quoting sheet
//! names that are not plain identifiers (`'My Sheet'!B7`).

use std::fmt;

use thiserror::Error;

/// Excel worksheet maximum row count.
pub const MAX_ROWS: u32 = 1_048_576;
/// Excel worksheet maximum column count.
pub const MAX_COLS: u32 = 16_384;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum A1ParseError {
    #[error("empty cell reference")]
    Empty,
    #[error("invalid cell reference `{0}`")]
    Invalid(String),
    #[error("row {row} is out of range in `{reference}`")]
    RowOutOfRange { reference: String, row: u64 },
    #[error("column `{letters}` is out of range in `{reference}`")]
    ColOutOfRange { reference: String, letters: String },
}

/// Cell coordinate with an optional sheet qualifier.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub sheet: Option<String>,
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self {
            sheet: None,
            row,
            col,
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    /// Parse `B7`, `$B$7`, `Sheet1!B7` or `'My Sheet'!B7`.
    pub fn parse_a1(reference: &str) -> Result<Self, A1ParseError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(A1ParseError::Empty);
        }

        let (sheet, cell) = match reference.rfind('!') {
            Some(idx) => {
                let sheet = unquote_sheet(&reference[..idx])
                    .ok_or_else(|| A1ParseError::Invalid(reference.to_string()))?;
                (Some(sheet), &reference[idx + 1..])
            }
            None => (None, reference),
        };

        let (row, col) = parse_cell(cell).map_err(|err| match err {
            A1ParseError::Invalid(_) => A1ParseError::Invalid(reference.to_string()),
            other => other,
        })?;
        Ok(Self { sheet, row, col })
    }

    /// Render without the sheet qualifier (`B7`).
    pub fn format_cell(&self) -> String {
        format!("{}{}", column_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            if needs_quotes(sheet) {
                write!(f, "'{}'!", sheet.replace('\'', "''"))?;
            } else {
                write!(f, "{sheet}!")?;
            }
        }
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

/// Convert a zero-based column index into letters (`0` → `A`, `27` → `AB`).
pub fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Convert column letters into a zero-based index. Lowercase is accepted.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let val = (ch.to_ascii_uppercase() - b'A') as u32;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}

fn parse_cell(cell: &str) -> Result<(u32, u32), A1ParseError> {
    let invalid = || A1ParseError::Invalid(cell.to_string());
    let body = cell.strip_prefix('$').unwrap_or(cell);
    let split = body
        .find(|c: char| c.is_ascii_digit() || c == '$')
        .ok_or_else(invalid)?;
    let (letters, rest) = body.split_at(split);
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let col = letters_to_column(letters).ok_or_else(invalid)?;
    if col >= MAX_COLS {
        return Err(A1ParseError::ColOutOfRange {
            reference: cell.to_string(),
            letters: letters.to_string(),
        });
    }
    let row: u64 = digits.parse().map_err(|_| invalid())?;
    if row == 0 || row > MAX_ROWS as u64 {
        return Err(A1ParseError::RowOutOfRange {
            reference: cell.to_string(),
            row,
        });
    }
    Ok(((row - 1) as u32, col))
}

fn unquote_sheet(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if let Some(inner) = raw.strip_prefix('\'') {
        let inner = inner.strip_suffix('\'')?;
        return Some(inner.replace("''", "'"));
    }
    Some(raw.to_string())
}

fn needs_quotes(sheet: &str) -> bool {
    sheet.is_empty()
        || sheet.starts_with(|c: char| c.is_ascii_digit())
        || !sheet
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letter_roundtrip() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(27), "AB");
        assert_eq!(letters_to_column("AB"), Some(27));
        assert_eq!(letters_to_column("ab"), Some(27));
        assert!(letters_to_column("A1").is_none());
    }

    #[test]
    fn parse_plain_and_absolute() {
        assert_eq!(CellRef::parse_a1("B7").unwrap(), CellRef::new(6, 1));
        assert_eq!(CellRef::parse_a1("$B$7").unwrap(), CellRef::new(6, 1));
        assert_eq!(CellRef::parse_a1("b$7").unwrap(), CellRef::new(6, 1));
    }

    #[test]
    fn parse_sheet_qualified() {
        let r = CellRef::parse_a1("Sheet1!C3").unwrap();
        assert_eq!(r.sheet(), Some("Sheet1"));
        assert_eq!((r.row, r.col), (2, 2));

        let r = CellRef::parse_a1("'My ''Data'''!A1").unwrap();
        assert_eq!(r.sheet(), Some("My 'Data'"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(CellRef::parse_a1(""), Err(A1ParseError::Empty));
        assert!(matches!(
            CellRef::parse_a1("7B"),
            Err(A1ParseError::Invalid(_))
        ));
        assert!(matches!(
            CellRef::parse_a1("A0"),
            Err(A1ParseError::RowOutOfRange { .. })
        ));
        assert!(matches!(
            CellRef::parse_a1("XFE1"),
            Err(A1ParseError::ColOutOfRange { .. })
        ));
    }

    #[test]
    fn display_quotes_when_needed() {
        assert_eq!(CellRef::new(6, 1).with_sheet("Sheet1").to_string(), "Sheet1!B7");
        assert_eq!(
            CellRef::new(0, 0).with_sheet("My Sheet").to_string(),
            "'My Sheet'!A1"
        );
        assert_eq!(CellRef::new(0, 0).format_cell(), "A1");
    }
}
