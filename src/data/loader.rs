use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{
    Dataset, Listing, ReviewDate, LAST_REVIEW, LATITUDE, LONGITUDE, PRICE, REQUIRED_COLUMNS,
    ROOM_TYPE,
};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a listings dataset from a CSV file with a header row.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    read_csv(file).with_context(|| format!("reading CSV {}", path.display()))
}

/// Write a dataset to a CSV file, replacing it if present.
pub fn save_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating CSV {}", path.display()))?;
    write_csv(dataset, file).with_context(|| format!("writing CSV {}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one listing per record.
///
/// `room_type`, `price`, `longitude`, `latitude` and `last_review` must be in
/// the header. Records shorter than the header are padded with nulls; longer
/// ones make the whole file invalid.
pub fn read_csv<R: Read>(source: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            bail!("CSV missing required column '{required}'");
        }
    }

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        if record.len() > columns.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, saw {}",
                columns.len(),
                record.len()
            );
        }

        let cells = columns
            .iter()
            .enumerate()
            .map(|(i, col)| (col.as_str(), record.get(i).unwrap_or("")));
        rows.push(Listing::from_cells(cells));
    }

    log::debug!("read {} rows with columns {:?}", rows.len(), columns);
    Ok(Dataset::new(columns, rows))
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// Write the dataset with its original header and no index column.
/// Nulls become empty cells.
pub fn write_csv<W: Write>(dataset: &Dataset, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer
        .write_record(&dataset.columns)
        .context("writing CSV header")?;

    let date_style = dataset.date_style();

    for (row_no, row) in dataset.rows.iter().enumerate() {
        let record: Vec<String> = dataset
            .columns
            .iter()
            .map(|col| match col.as_str() {
                ROOM_TYPE => row.room_type.clone().unwrap_or_default(),
                PRICE => format_number(row.price),
                LONGITUDE => format_number(row.longitude),
                LATITUDE => format_number(row.latitude),
                LAST_REVIEW => match &row.last_review {
                    ReviewDate::Raw(text) => text.clone(),
                    ReviewDate::Parsed(ts) => date_style.format(ts),
                    ReviewDate::Null => String::new(),
                },
                other => row
                    .extra
                    .get(other)
                    .and_then(|v| v.clone())
                    .unwrap_or_default(),
            })
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Shortest text that parses back to the same `f64` (`149`, `40.64749`).
fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
