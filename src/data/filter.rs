use std::fmt;

use serde::Serialize;

use super::model::{Dataset, Listing, ReviewDate};

// ---------------------------------------------------------------------------
// Bounds: inclusive numeric ranges
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` range. A missing value is never inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| v >= self.min && v <= self.max)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// New York City bounding box.
pub const LONGITUDE_BOUNDS: Bounds = Bounds::new(-74.25, -73.50);
pub const LATITUDE_BOUNDS: Bounds = Bounds::new(40.5, 41.2);

// ---------------------------------------------------------------------------
// FilterParams
// ---------------------------------------------------------------------------

/// Price limits for one cleaning pass.
///
/// Any pair is accepted: an inverted (or NaN) range keeps no rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub min_price: f64,
    pub max_price: f64,
}

impl FilterParams {
    pub fn new(min_price: f64, max_price: f64) -> Self {
        FilterParams {
            min_price,
            max_price,
        }
    }

    pub fn price_bounds(&self) -> Bounds {
        Bounds::new(self.min_price, self.max_price)
    }

    /// No price can satisfy the range: `min_price > max_price` or a NaN limit.
    pub fn is_empty_range(&self) -> bool {
        self.min_price.is_nan() || self.max_price.is_nan() || self.min_price > self.max_price
    }

    /// Whether a row passes the price and bounding-box rules.
    pub fn keeps(&self, row: &Listing) -> bool {
        self.price_bounds().contains(row.price)
            && LONGITUDE_BOUNDS.contains(row.longitude)
            && LATITUDE_BOUNDS.contains(row.latitude)
    }
}

// ---------------------------------------------------------------------------
// Cleaning steps
// ---------------------------------------------------------------------------

/// Row counts collected while cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub input_rows: usize,
    pub dropped_missing_room_type: usize,
    pub dropped_outliers: usize,
    /// Non-empty `last_review` values that could not be parsed.
    pub unparseable_dates: usize,
    pub output_rows: usize,
}

/// Rows whose `room_type` is present.
pub fn with_room_type(rows: &[Listing]) -> Vec<Listing> {
    rows.iter()
        .filter(|row| row.room_type.is_some())
        .cloned()
        .collect()
}

/// Return indices of rows that pass the outlier filter.
///
/// A row passes when all hold (bounds inclusive, missing values fail):
/// * `price` is within `[min_price, max_price]`
/// * `longitude` is within [`LONGITUDE_BOUNDS`]
/// * `latitude` is within [`LATITUDE_BOUNDS`]
pub fn kept_indices(rows: &[Listing], params: &FilterParams) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| params.keeps(row))
        .map(|(i, _)| i)
        .collect()
}

/// Parse every `last_review` in place. Returns how many became null.
pub fn convert_last_review(rows: &mut [Listing]) -> usize {
    let mut failed = 0;
    for row in rows {
        let converted = row.last_review.to_parsed();
        if matches!(row.last_review, ReviewDate::Raw(_)) && converted.is_null() {
            failed += 1;
        }
        row.last_review = converted;
    }
    failed
}

/// [`clean_with_stats`] without the counts.
#[cfg(test)]
pub fn clean(dataset: &Dataset, params: &FilterParams) -> Dataset {
    clean_with_stats(dataset, params).0
}

/// Clean a dataset: drop rows without `room_type`, drop price and location
/// outliers, then parse `last_review`. The input is left untouched; the
/// per-step row counts come back alongside the cleaned copy.
pub fn clean_with_stats(dataset: &Dataset, params: &FilterParams) -> (Dataset, CleanStats) {
    let mut stats = CleanStats {
        input_rows: dataset.len(),
        ..CleanStats::default()
    };

    log::info!("Drop samples with null values for `room_type`");
    let rows = with_room_type(&dataset.rows);
    stats.dropped_missing_room_type = dataset.len() - rows.len();

    if params.is_empty_range() {
        log::warn!(
            "price range {} is empty; every row will be dropped",
            params.price_bounds()
        );
    }
    log::info!(
        "Drop outliers: price {}, longitude {}, latitude {}",
        params.price_bounds(),
        LONGITUDE_BOUNDS,
        LATITUDE_BOUNDS
    );
    let mut kept: Vec<Listing> = kept_indices(&rows, params)
        .into_iter()
        .map(|i| rows[i].clone())
        .collect();
    stats.dropped_outliers = rows.len() - kept.len();

    log::info!("Convert last_review to datetime");
    stats.unparseable_dates = convert_last_review(&mut kept);
    if stats.unparseable_dates > 0 {
        log::warn!(
            "{} last_review values could not be parsed and were set to null",
            stats.unparseable_dates
        );
    }

    stats.output_rows = kept.len();
    (dataset.with_rows(kept), stats)
}
