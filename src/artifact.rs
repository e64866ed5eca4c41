//! Artifact store: where the job finds its input file and publishes its output.
//!
//! ```text
//!  <root>/
//!    <name>/
//!      v0/  metadata.json  raw_sample.csv
//!      v1/  metadata.json  raw_sample.csv
//!    runs/
//!      <run id>.json
//! ```

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::run::RunRecord;

const METADATA_FILE: &str = "metadata.json";
const RUNS_DIR: &str = "runs";
const LATEST: &str = "latest";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("invalid artifact identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("artifact '{0}' not found")]
    NotFound(String),

    #[error("artifact '{name}' has no version '{alias}'")]
    VersionNotFound { name: String, alias: String },

    #[error("artifact '{0}' contains no file")]
    Empty(String),

    #[error("artifact '{name}' contains {count} files, expected exactly one")]
    MultipleFiles { name: String, count: usize },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArtifactError>;

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// ArtifactRef – parsed identifier
// ---------------------------------------------------------------------------

/// `entity/project/name:alias`. Only the last path segment names the
/// artifact; the alias defaults to `latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub alias: String,
}

impl ArtifactRef {
    pub fn parse(identifier: &str) -> Result<Self> {
        let invalid = || ArtifactError::InvalidIdentifier(identifier.to_string());

        let last = identifier.rsplit('/').next().unwrap_or(identifier);
        let (name, alias) = match last.rsplit_once(':') {
            Some((name, alias)) => (name, alias),
            None => (last, LATEST),
        };
        if !is_valid_name(name) || alias.is_empty() {
            return Err(invalid());
        }
        Ok(ArtifactRef {
            name: name.to_string(),
            alias: alias.to_string(),
        })
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.alias)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name != RUNS_DIR
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

// ---------------------------------------------------------------------------
// Artifact – what gets published
// ---------------------------------------------------------------------------

/// A named file bundle waiting to be published.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub artifact_type: String,
    pub description: String,
    pub files: Vec<PathBuf>,
}

impl Artifact {
    pub fn new(name: &str, artifact_type: &str, description: &str) -> Self {
        Artifact {
            name: name.to_string(),
            artifact_type: artifact_type.to_string(),
            description: description.to_string(),
            files: Vec::new(),
        }
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }
}

/// Stored next to the files of every published version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    pub version: String,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ArtifactStore – the seam the job talks to
// ---------------------------------------------------------------------------

pub trait ArtifactStore {
    /// Local path of the single file held by the referenced version.
    fn resolve(&self, reference: &ArtifactRef) -> Result<PathBuf>;

    /// Store a new version of `artifact` and return its metadata.
    fn publish(&mut self, artifact: &Artifact) -> Result<ArtifactMetadata>;

    /// Keep the record of a finished run.
    fn record_run(&mut self, record: &RunRecord) -> Result<()>;
}

/// Filesystem-backed store rooted at one directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Existing version numbers of `name`, ascending.
    fn versions(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions: Vec<u32> = fs::read_dir(&dir)
            .map_err(io_at(&dir))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| parse_version(&entry.file_name().to_string_lossy()))
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    fn version_dir(&self, reference: &ArtifactRef) -> Result<PathBuf> {
        let versions = self.versions(&reference.name)?;
        if versions.is_empty() {
            return Err(ArtifactError::NotFound(reference.name.clone()));
        }
        let version = if reference.alias == LATEST {
            versions.last().copied()
        } else {
            parse_version(&reference.alias).filter(|v| versions.contains(v))
        };
        version
            .map(|v| self.root.join(&reference.name).join(format!("v{v}")))
            .ok_or_else(|| ArtifactError::VersionNotFound {
                name: reference.name.clone(),
                alias: reference.alias.clone(),
            })
    }
}

fn copy_files(sources: &[PathBuf], dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::with_capacity(sources.len());
    for src in sources {
        let file_name = src
            .file_name()
            .ok_or_else(|| ArtifactError::InvalidIdentifier(src.display().to_string()))?;
        fs::copy(src, dir.join(file_name)).map_err(io_at(src))?;
        files.push(file_name.to_string_lossy().into_owned());
    }
    Ok(files)
}

fn parse_version(s: &str) -> Option<u32> {
    s.strip_prefix('v').and_then(|n| n.parse().ok())
}

impl ArtifactStore for LocalArtifactStore {
    fn resolve(&self, reference: &ArtifactRef) -> Result<PathBuf> {
        let dir = self.version_dir(reference)?;
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(io_at(&dir))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.file_name() != Some(OsStr::new(METADATA_FILE)))
            .collect();

        match files.len() {
            0 => Err(ArtifactError::Empty(reference.to_string())),
            1 => Ok(files.remove(0)),
            count => Err(ArtifactError::MultipleFiles {
                name: reference.to_string(),
                count,
            }),
        }
    }

    fn publish(&mut self, artifact: &Artifact) -> Result<ArtifactMetadata> {
        if !is_valid_name(&artifact.name) {
            return Err(ArtifactError::InvalidIdentifier(artifact.name.clone()));
        }
        let next = self
            .versions(&artifact.name)?
            .last()
            .map_or(0, |v| v + 1);
        let version = format!("v{next}");
        let dir = self.root.join(&artifact.name).join(&version);
        fs::create_dir_all(&dir).map_err(io_at(&dir))?;

        let files = match copy_files(&artifact.files, &dir) {
            Ok(files) => files,
            Err(e) => {
                // a half-written version must not become `latest`
                let _ = fs::remove_dir_all(&dir);
                return Err(e);
            }
        };

        let metadata = ArtifactMetadata {
            name: artifact.name.clone(),
            artifact_type: artifact.artifact_type.clone(),
            description: artifact.description.clone(),
            version,
            files,
            created_at: Utc::now(),
        };
        let meta_path = dir.join(METADATA_FILE);
        let json = serde_json::to_string_pretty(&metadata)?;
        fs::write(&meta_path, json).map_err(io_at(&meta_path))?;

        log::debug!("published {}:{} to {}", metadata.name, metadata.version, dir.display());
        Ok(metadata)
    }

    fn record_run(&mut self, record: &RunRecord) -> Result<()> {
        let dir = self.root.join(RUNS_DIR);
        fs::create_dir_all(&dir).map_err(io_at(&dir))?;
        let path = dir.join(format!("{}.json", record.id));
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(io_at(&path))
    }
}
