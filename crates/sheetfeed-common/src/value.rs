use chrono::{Duration as ChronoDur, NaiveDate, NaiveDateTime, Timelike};
use std::fmt::{self, Display};

use crate::ExcelErrorKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── Excel date-serial utilities ───────────────────
Excel's 1900 serial date system:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but Excel thinks it does)
  Serial 61 = 1900-03-01
Serials below 61 count from 1899-12-31, later ones from 1899-12-30 so the
phantom day is skipped. The 1904 system counts from 1904-01-01.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateSystem {
    #[default]
    Excel1900,
    Excel1904,
}

impl Display for DateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSystem::Excel1900 => write!(f, "1900"),
            DateSystem::Excel1904 => write!(f, "1904"),
        }
    }
}

/// Convert an Excel serial into a wall-clock datetime, rounded to the
/// nearest millisecond. Returns `None` for negative or out-of-range serials.
pub fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let whole_days = serial.floor();
    let millis_in_day = ((serial - whole_days) * MILLIS_PER_DAY + 0.5) as i64;
    let whole_days = whole_days as i64;

    let base = match system {
        DateSystem::Excel1900 if whole_days < 61 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        DateSystem::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        DateSystem::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
    };
    let midnight = base
        .checked_add_signed(ChronoDur::try_days(whole_days)?)?
        .and_hms_opt(0, 0, 0)?;
    midnight.checked_add_signed(ChronoDur::try_milliseconds(millis_in_day)?)
}

/// Inverse of [`serial_to_datetime`] for the 1900 system.
pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch");
    let mut days = (dt.date() - epoch).num_days();
    // Dates before 1900-03-01 sit one day later on the phantom-leap-day scale
    if dt.date() < NaiveDate::from_ymd_opt(1900, 3, 1).expect("valid date") {
        days -= 1;
    }
    let millis = dt.time().num_seconds_from_midnight() as f64 * 1000.0
        + (dt.time().nanosecond() / 1_000_000) as f64;
    days as f64 + millis / MILLIS_PER_DAY
}

/// Storage kind of a cell, as reported by the workbook reader.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Numeric,
    String,
    Formula,
    Blank,
    Boolean,
    Error,
}

impl CellType {
    /// Uppercase label (`NUMERIC`, `FORMULA`, …).
    pub const fn label(self) -> &'static str {
        match self {
            CellType::Numeric => "NUMERIC",
            CellType::String => "STRING",
            CellType::Formula => "FORMULA",
            CellType::Blank => "BLANK",
            CellType::Boolean => "BOOLEAN",
            CellType::Error => "ERROR",
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value held by a cell (or the cached result of a formula cell).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Floating-point number; date-formatted cells carry their serial here.
    Numeric(f64),
    /// Integral value stored without a serial (xls/ods integer records).
    Int(i64),
    Text(String),
    Boolean(bool),
    Error(ExcelErrorKind),
    #[default]
    Blank,
}

impl CellValue {
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Numeric(_) | CellValue::Int(_) => CellType::Numeric,
            CellValue::Text(_) => CellType::String,
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::Error(_) => CellType::Error,
            CellValue::Blank => CellType::Blank,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Numeric(n) => write!(f, "{n}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Error(e) => write!(f, "{e}"),
            CellValue::Blank => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Numeric(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<ExcelErrorKind> for CellValue {
    fn from(value: ExcelErrorKind) -> Self {
        CellValue::Error(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn modern_serials() {
        assert_eq!(
            serial_to_datetime(44197.0, DateSystem::Excel1900),
            Some(dt(2021, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            serial_to_datetime(44000.5, DateSystem::Excel1900),
            Some(dt(2020, 6, 18, 12, 0, 0))
        );
    }

    #[test]
    fn early_1900_serials() {
        assert_eq!(
            serial_to_datetime(1.0, DateSystem::Excel1900),
            Some(dt(1900, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            serial_to_datetime(59.0, DateSystem::Excel1900),
            Some(dt(1900, 2, 28, 0, 0, 0))
        );
        assert_eq!(
            serial_to_datetime(61.0, DateSystem::Excel1900),
            Some(dt(1900, 3, 1, 0, 0, 0))
        );
    }

    #[test]
    fn system_1904() {
        assert_eq!(
            serial_to_datetime(0.0, DateSystem::Excel1904),
            Some(dt(1904, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn rounds_to_millisecond() {
        // 1/3 of a second past midnight
        let serial = 44197.0 + (1.0 / 3.0) / 86_400.0;
        let got = serial_to_datetime(serial, DateSystem::Excel1900).unwrap();
        assert_eq!(got.and_utc().timestamp_subsec_millis(), 333);
    }

    #[test]
    fn negative_serial_is_invalid() {
        assert_eq!(serial_to_datetime(-1.0, DateSystem::Excel1900), None);
        assert_eq!(serial_to_datetime(f64::NAN, DateSystem::Excel1900), None);
    }

    #[test]
    fn serial_roundtrip() {
        let d = dt(2023, 3, 1, 6, 30, 0);
        let serial = datetime_to_serial(&d);
        assert_eq!(serial_to_datetime(serial, DateSystem::Excel1900), Some(d));
        assert_eq!(datetime_to_serial(&dt(1900, 1, 1, 0, 0, 0)), 1.0);
    }

    #[test]
    fn value_kinds() {
        assert_eq!(CellValue::from(1.5).cell_type(), CellType::Numeric);
        assert_eq!(CellValue::Int(3).cell_type(), CellType::Numeric);
        assert_eq!(CellValue::from("x").cell_type(), CellType::String);
        assert_eq!(CellValue::Blank.cell_type(), CellType::Blank);
        assert_eq!(CellType::Formula.to_string(), "FORMULA");
    }
}
