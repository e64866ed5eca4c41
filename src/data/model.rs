use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

// ---------------------------------------------------------------------------
// Column names the cleaner depends on
// ---------------------------------------------------------------------------

pub const ROOM_TYPE: &str = "room_type";
pub const PRICE: &str = "price";
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";
pub const LAST_REVIEW: &str = "last_review";

/// Columns that must be present in every input header.
pub const REQUIRED_COLUMNS: [&str; 5] = [ROOM_TYPE, PRICE, LONGITUDE, LATITUDE, LAST_REVIEW];

/// Spellings read as "missing" in any cell, matching the usual dataframe NA set.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw CSV cell should be treated as null.
pub fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s)
}

/// Raw cell → `Option<String>`, with null tokens mapped to `None`.
pub fn nullable_text(s: &str) -> Option<String> {
    if is_null_token(s) {
        None
    } else {
        Some(s.to_string())
    }
}

/// Raw cell → finite `f64`. Anything else (null, text, NaN, inf) is `None`.
pub fn nullable_number(s: &str) -> Option<f64> {
    if is_null_token(s) {
        return None;
    }
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// ReviewDate – the `last_review` cell
// ---------------------------------------------------------------------------

/// `last_review` goes from text as read to a parsed timestamp (or null)
/// once the cleaner has converted it.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewDate {
    /// Text exactly as read from the file.
    Raw(String),
    Parsed(NaiveDateTime),
    Null,
}

impl ReviewDate {
    pub fn from_cell(s: &str) -> Self {
        match nullable_text(s) {
            Some(text) => ReviewDate::Raw(text),
            None => ReviewDate::Null,
        }
    }

    /// Convert to `Parsed` or `Null`. Parsed and null values pass through.
    pub fn to_parsed(&self) -> ReviewDate {
        match self {
            ReviewDate::Raw(text) => match parse_review_date(text) {
                Some(ts) => ReviewDate::Parsed(ts),
                None => ReviewDate::Null,
            },
            other => other.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ReviewDate::Null)
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            ReviewDate::Parsed(ts) => Some(*ts),
            _ => None,
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse the date spellings found in listing exports.
///
/// Offsets (RFC 3339) are normalised to UTC and dropped; date-only values
/// land at midnight.
pub fn parse_review_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Listing – one row of the dataset
// ---------------------------------------------------------------------------

/// A single listing (one row of the source file).
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub room_type: Option<String>,
    pub price: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub last_review: ReviewDate,
    /// Every other column: column_name → value, carried through untouched.
    pub extra: BTreeMap<String, Option<String>>,
}

impl Listing {
    /// Build a row from `(column, cell)` pairs. Unknown columns go to `extra`.
    pub fn from_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut listing = Listing {
            room_type: None,
            price: None,
            longitude: None,
            latitude: None,
            last_review: ReviewDate::Null,
            extra: BTreeMap::new(),
        };
        for (col, cell) in cells {
            match col {
                ROOM_TYPE => listing.room_type = nullable_text(cell),
                PRICE => listing.price = nullable_number(cell),
                LONGITUDE => listing.longitude = nullable_number(cell),
                LATITUDE => listing.latitude = nullable_number(cell),
                LAST_REVIEW => listing.last_review = ReviewDate::from_cell(cell),
                other => {
                    listing.extra.insert(other.to_string(), nullable_text(cell));
                }
            }
        }
        listing
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// All rows plus the header they were read with.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names in file order.
    pub columns: Vec<String>,
    pub rows: Vec<Listing>,
}

/// How `last_review` is rendered when the dataset is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateStyle {
    /// `YYYY-MM-DD`: every parsed value sits at midnight.
    DateOnly,
    /// `YYYY-MM-DD HH:MM:SS`
    DateTime,
    /// `YYYY-MM-DD HH:MM:SS.ffffff`: some value has whole microseconds.
    Micros,
    /// `YYYY-MM-DD HH:MM:SS.fffffffff`: some value needs nanoseconds.
    Nanos,
}

impl DateStyle {
    pub fn format(self, ts: &NaiveDateTime) -> String {
        let fmt = match self {
            DateStyle::DateOnly => "%Y-%m-%d",
            DateStyle::DateTime => "%Y-%m-%d %H:%M:%S",
            DateStyle::Micros => "%Y-%m-%d %H:%M:%S%.6f",
            DateStyle::Nanos => "%Y-%m-%d %H:%M:%S%.9f",
        };
        ts.format(fmt).to_string()
    }

    /// Narrowest style that keeps `ts` intact.
    fn needed_for(ts: &NaiveDateTime) -> Self {
        let nanos = ts.nanosecond();
        if nanos % 1_000 != 0 {
            DateStyle::Nanos
        } else if nanos != 0 {
            DateStyle::Micros
        } else if ts.num_seconds_from_midnight() != 0 {
            DateStyle::DateTime
        } else {
            DateStyle::DateOnly
        }
    }
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Listing>) -> Self {
        Dataset { columns, rows }
    }

    /// Same header, different rows.
    pub fn with_rows(&self, rows: Vec<Listing>) -> Self {
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pick the rendering for `last_review` across the whole column: the
    /// widest style any single value needs.
    pub fn date_style(&self) -> DateStyle {
        self.rows
            .iter()
            .filter_map(|r| r.last_review.as_datetime())
            .map(|ts| DateStyle::needed_for(&ts))
            .max()
            .unwrap_or(DateStyle::DateOnly)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows x {} columns", self.len(), self.columns.len())
    }
}
