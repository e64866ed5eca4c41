/// Data layer: listing rows, CSV reading/writing, and the cleaning filters.
///
/// Architecture:
/// ```text
///   listings .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  header + Vec<Listing>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  room_type, outliers, last_review → new Dataset
///   └──────────┘
///        │
///        ▼
///   clean_sample.csv
/// ```

pub mod loader;
pub mod model;
pub mod filter;
