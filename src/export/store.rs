//! Durable storage for the selected model, its scaler and feature order

use crate::error::{PipelineError, Result};
use crate::preprocessing::StandardScaler;
use crate::training::{Hyperparameters, RandomForest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The unit of persistence: everything needed to score new rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: RandomForest,
    pub scaler: StandardScaler,
    /// Column order the model and scaler were fitted with
    pub feature_names: Vec<String>,
    pub hyperparameters: Hyperparameters,
    pub train_accuracy: f64,
    pub trained_at: DateTime<Utc>,
}

/// On-disk wrapper with integrity header
#[derive(Debug, Serialize, Deserialize)]
struct StoredArtifact {
    magic: [u8; 4],
    format_version: u32,
    checksum: u64,
    payload: Vec<u8>,
}

impl StoredArtifact {
    const MAGIC: [u8; 4] = *b"CHRN";
    const VERSION: u32 = 1;

    fn seal(artifact: &ModelArtifact) -> Result<Self> {
        let payload = bincode::serialize(artifact)?;
        Ok(Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            checksum: fnv1a(&payload),
            payload,
        })
    }

    fn open(self) -> Result<ModelArtifact> {
        if self.magic != Self::MAGIC {
            return Err(PipelineError::SerializationError("not a model artifact".to_string()));
        }
        if self.format_version != Self::VERSION {
            return Err(PipelineError::SerializationError(format!(
                "unsupported artifact version {}",
                self.format_version
            )));
        }
        if fnv1a(&self.payload) != self.checksum {
            return Err(PipelineError::SerializationError("artifact checksum mismatch".to_string()));
        }
        Ok(bincode::deserialize(&self.payload)?)
    }
}

/// FNV-1a hash
fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Named model artifacts under one directory. Last writer wins.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `name`; names are plain file names
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        valid.then(|| self.root.join(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map_or(false, |p| p.is_file())
    }

    /// Persist `artifact` as `name`, replacing any previous artifact atomically
    pub fn write(&self, artifact: &ModelArtifact, name: &str) -> Result<PathBuf> {
        let path = self
            .path_for(name)
            .ok_or_else(|| PipelineError::PersistenceFailure(format!("invalid artifact name {:?}", name)))?;

        fs::create_dir_all(&self.root).map_err(|e| {
            PipelineError::PersistenceFailure(format!("cannot create {}: {}", self.root.display(), e))
        })?;

        let bytes = bincode::serialize(&StoredArtifact::seal(artifact)?)?;

        // Write beside the target and rename so readers never see a partial file
        let tmp = self.root.join(format!(".{}.{}.tmp", name, std::process::id()));
        let result = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(PipelineError::PersistenceFailure(format!(
                "cannot write {}: {}",
                path.display(),
                e
            )));
        }

        info!(path = %path.display(), bytes = bytes.len(), "Saved model artifact");
        Ok(path)
    }

    /// Load the artifact stored as `name`
    pub fn read(&self, name: &str) -> Result<ModelArtifact> {
        let path = self
            .path_for(name)
            .ok_or_else(|| PipelineError::ArtifactNotFound(name.to_string()))?;

        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PipelineError::ArtifactNotFound(path.display().to_string()),
            _ => PipelineError::PersistenceFailure(format!("cannot read {}: {}", path.display(), e)),
        })?;

        let stored: StoredArtifact = bincode::deserialize(&bytes)?;
        let artifact = stored.open()?;
        debug!(path = %path.display(), features = artifact.feature_names.len(), "Loaded model artifact");
        Ok(artifact)
    }
}
