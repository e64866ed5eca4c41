use std::path::Path;

use anyhow::Result;

use crate::artifact::{Artifact, ArtifactStore};
use crate::cli::Args;
use crate::data::filter::{CleanStats, clean_with_stats};
use crate::data::loader::{load_csv, save_csv};
use crate::run::Run;

pub const JOB_TYPE: &str = "basic_cleaning";

/// File the cleaned data is staged in before publishing.
pub const STAGING_FILE: &str = "clean_sample.csv";

/// Run the job and close the run: finished on success, failed with the
/// error otherwise. The job's own error is the one returned.
pub fn execute<S: ArtifactStore>(args: &Args, mut run: Run<S>, staging_dir: &Path) -> Result<CleanStats> {
    match go(args, &mut run, staging_dir) {
        Ok(stats) => {
            run.finish()?;
            Ok(stats)
        }
        Err(e) => {
            if let Err(record_err) = run.fail(&e) {
                log::warn!("{record_err:#}");
            }
            Err(e)
        }
    }
}

/// Download the input artifact, clean it, and publish the result.
///
/// The cleaned CSV is staged in `staging_dir` and removed once the store
/// has taken its copy.
pub fn go<S: ArtifactStore>(args: &Args, run: &mut Run<S>, staging_dir: &Path) -> Result<CleanStats> {
    let params = args.filter_params();
    run.update_config(args)?;
    log::debug!("run config: {:?}", run.config());

    log::info!("Download artifact {}", args.input_artifact);
    let input_path = run.use_artifact(&args.input_artifact)?;

    let dataset = load_csv(&input_path)?;
    log::info!("Loaded {dataset} from {}", input_path.display());

    let (cleaned, stats) = clean_with_stats(&dataset, &params);
    log::info!(
        "Kept {} of {} rows ({} without room_type, {} outliers)",
        stats.output_rows,
        stats.input_rows,
        stats.dropped_missing_room_type,
        stats.dropped_outliers
    );

    if cleaned.is_empty() {
        log::warn!("no rows survived cleaning; publishing a header-only file");
    }

    log::info!("Save data frame to a csv file");
    let staging = staging_dir.join(STAGING_FILE);
    stage(&staging, |path| save_csv(&cleaned, path))?;

    log::info!("Load the clean data to the artifact store");
    let mut artifact = Artifact::new(
        &args.output_artifact,
        &args.output_type,
        &args.output_description,
    );
    artifact.add_file(&staging);

    log::info!("Logging artifact");
    let published = run.log_artifact(&artifact);

    if let Err(e) = std::fs::remove_file(&staging) {
        log::warn!("could not remove {}: {e}", staging.display());
    }
    let metadata = published?;
    log::info!("Published {}:{}", metadata.name, metadata.version);

    run.summarize("clean_stats", &stats)?;
    Ok(stats)
}

/// Write the staging file, removing whatever was written if `write` fails.
fn stage(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let result = write(path);
    if result.is_err() && path.is_file() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("could not remove {}: {e}", path.display());
        }
    }
    result
}
