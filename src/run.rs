use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::artifact::{Artifact, ArtifactMetadata, ArtifactRef, ArtifactStore};

// ---------------------------------------------------------------------------
// RunRecord – what a finished run leaves behind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Finished,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub job_type: String,
    pub config: Map<String, Value>,
    /// `name:version` of every artifact read.
    pub used_artifacts: Vec<String>,
    /// `name:version` of every artifact published.
    pub logged_artifacts: Vec<String>,
    pub summary: Map<String, Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
}

// ---------------------------------------------------------------------------
// Run – tracking context handed to a job
// ---------------------------------------------------------------------------

/// One tracked execution of a job. Owns the store it reads from and
/// publishes to; nothing about it is process-global.
pub struct Run<S: ArtifactStore> {
    record: RunRecord,
    store: S,
}

impl<S: ArtifactStore> Run<S> {
    pub fn init(job_type: &str, store: S) -> Self {
        let started_at = Utc::now();
        let id = format!("{job_type}-{}", started_at.format("%Y%m%dT%H%M%S%6f"));
        log::debug!("starting run {id}");
        Run {
            record: RunRecord {
                id,
                job_type: job_type.to_string(),
                config: Map::new(),
                used_artifacts: Vec::new(),
                logged_artifacts: Vec::new(),
                summary: Map::new(),
                started_at,
                finished_at: None,
                status: RunStatus::Running,
            },
            store,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.record.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Merge the fields of a serializable struct into the run config.
    pub fn update_config<T: Serialize>(&mut self, values: &T) -> Result<()> {
        match serde_json::to_value(values).context("serializing run config")? {
            Value::Object(map) => {
                self.record.config.extend(map);
                Ok(())
            }
            other => bail!("run config must be an object, got {other}"),
        }
    }

    /// Record a value in the run summary.
    pub fn summarize<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("serializing summary '{key}'"))?;
        self.record.summary.insert(key.to_string(), value);
        Ok(())
    }

    /// Resolve an input artifact to a local file and note it as used.
    pub fn use_artifact(&mut self, identifier: &str) -> Result<PathBuf> {
        let reference = ArtifactRef::parse(identifier)?;
        let path = self
            .store
            .resolve(&reference)
            .with_context(|| format!("resolving artifact {identifier}"))?;
        self.record.used_artifacts.push(reference.to_string());
        Ok(path)
    }

    /// Publish an artifact and note it as produced by this run.
    pub fn log_artifact(&mut self, artifact: &Artifact) -> Result<ArtifactMetadata> {
        let metadata = self
            .store
            .publish(artifact)
            .with_context(|| format!("publishing artifact {}", artifact.name))?;
        self.record
            .logged_artifacts
            .push(format!("{}:{}", metadata.name, metadata.version));
        Ok(metadata)
    }

    /// Stamp the finish time and hand the record to the store.
    pub fn finish(self) -> Result<RunRecord> {
        self.close(RunStatus::Finished)
    }

    /// Like [`Run::finish`], but records the error that ended the job.
    pub fn fail(self, error: &anyhow::Error) -> Result<RunRecord> {
        self.close(RunStatus::Failed {
            error: format!("{error:#}"),
        })
    }

    fn close(mut self, status: RunStatus) -> Result<RunRecord> {
        self.record.finished_at = Some(Utc::now());
        self.record.status = status;
        self.store
            .record_run(&self.record)
            .with_context(|| format!("recording run {}", self.record.id))?;
        log::debug!("closed run {} ({:?})", self.record.id, self.record.status);
        Ok(self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::LocalArtifactStore;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Params {
        min_price: f64,
        max_price: f64,
    }

    #[test]
    fn config_collects_struct_fields() {
        let root = TempDir::new().unwrap();
        let mut run = Run::init("basic_cleaning", LocalArtifactStore::new(root.path()));
        run.update_config(&Params { min_price: 10.0, max_price: 350.0 }).unwrap();
        assert_eq!(run.config().get("min_price"), Some(&Value::from(10.0)));
        assert_eq!(run.config().get("max_price"), Some(&Value::from(350.0)));
        assert!(run.id().starts_with("basic_cleaning-"));
    }

    #[test]
    fn config_rejects_non_objects() {
        let root = TempDir::new().unwrap();
        let mut run = Run::init("basic_cleaning", LocalArtifactStore::new(root.path()));
        assert!(run.update_config(&42).is_err());
    }

    #[test]
    fn tracks_used_and_logged_artifacts() {
        let root = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let src = scratch.path().join("sample.csv");
        std::fs::write(&src, "a\n1\n").unwrap();

        let mut run = Run::init("upload", LocalArtifactStore::new(root.path()));
        let mut artifact = Artifact::new("sample.csv", "raw_data", "raw");
        artifact.add_file(&src);
        run.log_artifact(&artifact).unwrap();
        let resolved = run.use_artifact("project/sample.csv:latest").unwrap();
        assert_eq!(std::fs::read_to_string(resolved).unwrap(), "a\n1\n");
        run.summarize("rows", &1).unwrap();

        let record = run.finish().unwrap();
        assert_eq!(record.status, RunStatus::Finished);
        assert_eq!(record.logged_artifacts, vec!["sample.csv:v0".to_string()]);
        assert_eq!(record.used_artifacts, vec!["sample.csv:latest".to_string()]);
        assert!(record.finished_at.is_some());

        let saved = std::fs::read_to_string(root.path().join("runs").join(format!("{}.json", record.id)))
            .unwrap();
        let saved: RunRecord = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved, record);
    }

    #[test]
    fn unknown_input_artifact_is_an_error() {
        let root = TempDir::new().unwrap();
        let mut run = Run::init("basic_cleaning", LocalArtifactStore::new(root.path()));
        let err = run.use_artifact("sample.csv:latest").unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn failed_run_is_recorded_with_its_error() {
        let root = TempDir::new().unwrap();
        let mut run = Run::init("basic_cleaning", LocalArtifactStore::new(root.path()));
        let err = run.use_artifact("sample.csv:latest").unwrap_err();

        let record = run.fail(&err).unwrap();
        match &record.status {
            RunStatus::Failed { error } => assert!(error.contains("resolving artifact sample.csv:latest")),
            other => panic!("expected a failed run, got {other:?}"),
        }
        assert!(record.finished_at.is_some());
        assert!(record.used_artifacts.is_empty());

        let saved = std::fs::read_to_string(root.path().join("runs").join(format!("{}.json", record.id)))
            .unwrap();
        let json: Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(json["status"]["state"], "failed");
        let saved: RunRecord = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved, record);
    }
}
