use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::data::filter::FilterParams;

/// A very basic data cleaning
///
/// Reads the input artifact, drops rows without `room_type`, drops price and
/// location outliers, parses `last_review`, and publishes the result as a new
/// artifact.
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "basic-cleaning", version)]
pub struct Args {
    /// Fully-qualified name for the input artifact
    #[arg(long = "input_artifact")]
    pub input_artifact: String,

    /// Name of the output artifact
    #[arg(long = "output_artifact")]
    pub output_artifact: String,

    /// Type of the output artifact to create
    #[arg(long = "output_type")]
    pub output_type: String,

    /// Description for the output artifact
    #[arg(long = "output_description")]
    pub output_description: String,

    /// Minimum price
    #[arg(long = "min_price", allow_negative_numbers = true)]
    pub min_price: f64,

    /// Maximum price
    #[arg(long = "max_price", allow_negative_numbers = true)]
    pub max_price: f64,

    /// Directory of the local artifact store
    #[arg(
        long = "artifact_root",
        env = "BASIC_CLEANING_ARTIFACT_ROOT",
        default_value = "artifacts"
    )]
    #[serde(skip)]
    pub artifact_root: PathBuf,
}

impl Args {
    pub fn filter_params(&self) -> FilterParams {
        FilterParams::new(self.min_price, self.max_price)
    }
}
