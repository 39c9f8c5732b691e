//! Per-column timestamp settings: zone, strftime format, default date.

use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::schema::ColumnType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sheetfeed_common::{DateSystem, serial_to_datetime};
use std::fmt;

/// Zone used to interpret wall-clock values.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TimeZoneSpec {
    #[default]
    Utc,
    /// Fixed offset such as `+09:00` or `-0500`.
    Fixed(FixedOffset),
    /// IANA zone such as `Asia/Tokyo`.
    Named(chrono_tz::Tz),
}

impl TimeZoneSpec {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(TimeZoneSpec::Utc);
        }
        if let Some(offset) = parse_offset(trimmed) {
            return Ok(TimeZoneSpec::Fixed(offset));
        }
        trimmed
            .parse::<chrono_tz::Tz>()
            .map(TimeZoneSpec::Named)
            .map_err(|_| ParseError::Config(format!("unknown time zone `{s}`")))
    }

    /// Resolve a wall-clock value in this zone. Ambiguous local times take
    /// the earlier instant; times inside a DST gap have no instant.
    pub fn from_local(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            TimeZoneSpec::Utc => Some(naive.and_utc()),
            TimeZoneSpec::Fixed(offset) => offset
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            TimeZoneSpec::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl fmt::Display for TimeZoneSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneSpec::Utc => f.write_str("UTC"),
            TimeZoneSpec::Fixed(offset) => write!(f, "{offset}"),
            TimeZoneSpec::Named(tz) => f.write_str(tz.name()),
        }
    }
}

// `+09:00`, `-0500`, `+09`, optionally prefixed by `UTC`/`GMT`
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let s = s
        .strip_prefix("UTC")
        .or_else(|| s.strip_prefix("GMT"))
        .unwrap_or(s);
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// strftime-style parser (chrono syntax; `.%N` and `.%L` are accepted as
/// fractional seconds).
#[derive(Clone, Debug, PartialEq)]
pub struct TimestampFormatter {
    pattern: String,
    has_date: bool,
    has_time: bool,
    has_offset: bool,
    epoch: bool,
}

const DATE_DIRECTIVES: &[char] = &[
    'Y', 'y', 'C', 'm', 'b', 'B', 'h', 'd', 'e', 'j', 'F', 'D', 'x', 'U', 'W', 'G', 'V',
];
const TIME_DIRECTIVES: &[char] = &['H', 'k', 'I', 'l', 'M', 'S', 'T', 'R', 'X', 'r'];

impl TimestampFormatter {
    pub fn new(format: &str) -> Result<Self, ParseError> {
        if format.is_empty() {
            return Err(ParseError::Config("timestamp format must not be empty".into()));
        }
        let pattern = format.replace(".%N", "%.f").replace(".%L", "%.f");
        let specs = directives(&pattern);
        let any = |set: &[char]| specs.iter().any(|c| set.contains(c));
        let epoch = any(&['s']);
        Ok(Self {
            has_date: epoch || any(DATE_DIRECTIVES),
            has_time: epoch || any(TIME_DIRECTIVES),
            has_offset: epoch || any(&['z']),
            epoch,
            pattern,
        })
    }

    /// Parse `text`. Without an offset directive the wall clock is read in
    /// `zone`; a missing date part takes `default_date`, a missing time part
    /// is midnight.
    pub fn parse(
        &self,
        text: &str,
        zone: &TimeZoneSpec,
        default_date: NaiveDate,
    ) -> Result<DateTime<Utc>, ParseError> {
        let fail = |message: String| ParseError::TimestampParse {
            value: text.to_string(),
            format: self.pattern.clone(),
            message,
        };

        let mut input = text.trim().to_string();
        let mut pattern = self.pattern.clone();
        if !self.has_date {
            input = format!("{} {input}", default_date.format("%Y-%m-%d"));
            pattern = format!("%Y-%m-%d {pattern}");
        }
        if !self.has_time {
            input.push_str(" 00:00:00");
            pattern.push_str(" %H:%M:%S");
        }

        if self.epoch {
            return NaiveDateTime::parse_from_str(&input, &pattern)
                .map(|dt| dt.and_utc())
                .map_err(|e| fail(e.to_string()));
        }
        if self.has_offset {
            return DateTime::parse_from_str(&input, &pattern)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| fail(e.to_string()));
        }
        let naive =
            NaiveDateTime::parse_from_str(&input, &pattern).map_err(|e| fail(e.to_string()))?;
        zone.from_local(&naive)
            .ok_or_else(|| fail(format!("local time does not exist in {zone}")))
    }
}

// Conversion characters of every `%` directive, ignoring flags and widths.
fn directives(pattern: &str) -> Vec<char> {
    let mut out = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        for d in chars.by_ref() {
            if d.is_ascii_alphabetic() || d == '%' {
                out.push(d);
                break;
            }
        }
    }
    out
}

/// Resolved settings for one timestamp column.
#[derive(Clone, Debug)]
pub struct TimestampInfo {
    pub zone: TimeZoneSpec,
    pub formatter: TimestampFormatter,
    pub default_date: NaiveDate,
}

impl TimestampInfo {
    pub fn new(zone: &str, format: &str, default_date: &str) -> Result<Self, ParseError> {
        Ok(Self {
            zone: TimeZoneSpec::parse(zone)?,
            formatter: TimestampFormatter::new(format)?,
            default_date: NaiveDate::parse_from_str(default_date, "%Y-%m-%d").map_err(|e| {
                ParseError::Config(format!("invalid default date `{default_date}`: {e}"))
            })?,
        })
    }

    pub fn parse(&self, text: &str) -> Result<DateTime<Utc>, ParseError> {
        self.formatter.parse(text, &self.zone, self.default_date)
    }

    /// Spreadsheet serial read as a wall-clock value in this column's zone.
    pub fn from_serial(
        &self,
        serial: f64,
        system: DateSystem,
    ) -> Result<DateTime<Utc>, ParseError> {
        let naive = serial_to_datetime(serial, system).ok_or_else(|| {
            ParseError::Conversion(format!("invalid date serial {serial}"))
        })?;
        self.zone.from_local(&naive).ok_or_else(|| {
            ParseError::Conversion(format!(
                "date serial {serial} ({naive}) does not exist in {}",
                self.zone
            ))
        })
    }
}

/// Timestamp settings indexed by column position, built once per session.
#[derive(Clone, Debug, Default)]
pub struct TimestampParserTable {
    entries: Vec<Option<TimestampInfo>>,
}

impl TimestampParserTable {
    pub fn build(config: &ParserConfig) -> Result<Self, ParseError> {
        let mut entries = Vec::with_capacity(config.columns.len());
        for column in &config.columns {
            if column.column_type != ColumnType::Timestamp {
                entries.push(None);
                continue;
            }
            let info = TimestampInfo::new(
                column.timezone.as_deref().unwrap_or(&config.default_timezone),
                column.format.as_deref().unwrap_or(&config.default_timestamp_format),
                column.date.as_deref().unwrap_or(&config.default_date),
            )
            .map_err(|e| match e {
                ParseError::Config(msg) => {
                    ParseError::Config(format!("column {}: {msg}", column.name))
                }
                other => other,
            })?;
            entries.push(Some(info));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, index: usize) -> Option<&TimestampInfo> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
