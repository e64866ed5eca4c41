mod artifact;
mod cli;
mod data;
mod job;
mod run;

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Parser;

use artifact::LocalArtifactStore;
use cli::Args;
use run::Run;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{} {}", buf.timestamp(), record.args()))
        .init();

    let args = Args::parse();

    let store = LocalArtifactStore::new(&args.artifact_root);
    let run = Run::init(job::JOB_TYPE, store);
    log::info!(
        "Run {} using artifact store {}",
        run.id(),
        run.store().root().display()
    );

    job::execute(&args, run, Path::new("."))?;
    Ok(())
}
