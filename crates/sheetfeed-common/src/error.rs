//! Spreadsheet error codes as stored in cells.
//!
//! `ExcelErrorKind` carries both the text Excel shows (`#DIV/0!`) and the
//! numeric code the binary formats store (`0x07`), so callers can emit
//! whichever representation their output column wants.

use std::fmt;

/// All error codes a cell can hold.
///
/// **Note:** names are CamelCase (idiomatic Rust) while `Display`
/// renders them exactly as Excel shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExcelErrorKind {
    Null,
    Div,
    Value,
    Ref,
    Name,
    Num,
    Na,
    GettingData,
    Spill,
    Calc,
    Circ,
    NImpl,
}

impl fmt::Display for ExcelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl ExcelErrorKind {
    /// Canonical label, e.g. `#N/A`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Null => "#NULL!",
            Self::Div => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Na => "#N/A",
            Self::GettingData => "#GETTING_DATA",
            Self::Spill => "#SPILL!",
            Self::Calc => "#CALC!",
            Self::Circ => "~CIRCULAR~REF~",
            Self::NImpl => "~FUNCTION~NOT~IMPLEMENTED~",
        }
    }

    /// Numeric code as stored by BIFF/XLSX writers.
    ///
    /// The two internal codes (`Circ`, `NImpl`) are negative and never
    /// appear in files written by Excel itself.
    pub const fn code(self) -> i32 {
        match self {
            Self::Null => 0x00,
            Self::Div => 0x07,
            Self::Value => 0x0F,
            Self::Ref => 0x17,
            Self::Name => 0x1D,
            Self::Num => 0x24,
            Self::Na => 0x2A,
            Self::GettingData => 0x2B,
            Self::Spill => 0x2C,
            Self::Calc => 0x2D,
            Self::Circ => -60,
            Self::NImpl => -30,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0x00 => Self::Null,
            0x07 => Self::Div,
            0x0F => Self::Value,
            0x17 => Self::Ref,
            0x1D => Self::Name,
            0x24 => Self::Num,
            0x2A => Self::Na,
            0x2B => Self::GettingData,
            0x2C => Self::Spill,
            0x2D => Self::Calc,
            -60 => Self::Circ,
            -30 => Self::NImpl,
            _ => return None,
        })
    }

    /// Parse a label such as `#div/0!` (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_uppercase().as_str() {
            "#NULL!" => Self::Null,
            "#DIV/0!" => Self::Div,
            "#VALUE!" => Self::Value,
            "#REF!" => Self::Ref,
            "#NAME?" => Self::Name,
            "#NUM!" => Self::Num,
            "#N/A" => Self::Na,
            "#GETTING_DATA" => Self::GettingData,
            "#SPILL!" => Self::Spill,
            "#CALC!" => Self::Calc,
            "~CIRCULAR~REF~" => Self::Circ,
            "~FUNCTION~NOT~IMPLEMENTED~" => Self::NImpl,
            _ => return None,
        })
    }
}

impl PartialEq<str> for ExcelErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.label() == other
    }
}

impl PartialEq<&str> for ExcelErrorKind {
    fn eq(&self, other: &&str) -> bool {
        self.label() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_codes_agree() {
        for kind in [
            ExcelErrorKind::Null,
            ExcelErrorKind::Div,
            ExcelErrorKind::Value,
            ExcelErrorKind::Ref,
            ExcelErrorKind::Name,
            ExcelErrorKind::Num,
            ExcelErrorKind::Na,
            ExcelErrorKind::GettingData,
            ExcelErrorKind::Circ,
        ] {
            assert_eq!(ExcelErrorKind::from_code(kind.code()), Some(kind));
            assert_eq!(ExcelErrorKind::parse(kind.label()), Some(kind));
        }
    }

    #[test]
    fn parse_is_lenient_about_case() {
        assert_eq!(ExcelErrorKind::parse(" #div/0! "), Some(ExcelErrorKind::Div));
        assert_eq!(ExcelErrorKind::parse("#n/a"), Some(ExcelErrorKind::Na));
        assert_eq!(ExcelErrorKind::parse("oops"), None);
    }

    #[test]
    fn display_matches_excel() {
        assert_eq!(ExcelErrorKind::Div.to_string(), "#DIV/0!");
        assert_eq!(ExcelErrorKind::Div.code(), 7);
        assert!(ExcelErrorKind::Na == "#N/A");
    }
}
