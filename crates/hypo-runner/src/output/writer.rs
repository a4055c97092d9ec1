use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::OutputError;

pub const MANIFEST_FILE: &str = "manifest.json";

/// One written file, relative to the run's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: Uuid,
    pub experiment: String,
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<Artifact>,
}

/// Write `contents` to a hidden temporary sibling of `path`, then rename it
/// over `path`. Readers never observe a partially written file.
///
/// # Errors
///
/// [`OutputError::Io`] if either the write or the rename fails; the
/// temporary file is removed in both cases.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    if let Err(e) = fs::write(&tmp, contents) {
        discard_temp(&tmp);
        return Err(OutputError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        discard_temp(&tmp);
        return Err(OutputError::io(path, e));
    }
    Ok(())
}

fn discard_temp(tmp: &Path) {
    match fs::remove_file(tmp) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %tmp.display(), error = %e, "temporary file left behind");
        }
        _ => {}
    }
}

/// Writes artifacts into one directory and keeps the manifest entries.
#[derive(Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    artifacts: Vec<Artifact>,
}

impl ArtifactWriter {
    /// # Errors
    ///
    /// [`OutputError::Io`] when the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, OutputError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| OutputError::io(&dir, e))?;
        Ok(Self {
            dir,
            artifacts: Vec::new(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Write one artifact. Rewriting a name replaces its manifest entry.
    ///
    /// # Errors
    ///
    /// [`OutputError::Io`] from [`write_atomic`].
    pub fn write(&mut self, name: &str, contents: &[u8]) -> Result<Artifact, OutputError> {
        write_atomic(&self.dir.join(name), contents)?;
        let artifact = Artifact {
            path: name.to_string(),
            bytes: contents.len() as u64,
            sha256: format!("{:x}", Sha256::digest(contents)),
        };
        tracing::info!(path = %self.dir.join(name).display(), bytes = artifact.bytes, "artifact written");
        self.artifacts.retain(|a| a.path != name);
        self.artifacts.push(artifact.clone());
        Ok(artifact)
    }

    /// Pretty-printed JSON artifact.
    ///
    /// # Errors
    ///
    /// [`OutputError::Serialize`] or [`OutputError::Io`].
    pub fn write_json<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<Artifact, OutputError> {
        let body = serde_json::to_vec_pretty(value).map_err(|source| OutputError::Serialize {
            what: name.to_string(),
            source,
        })?;
        self.write(name, &body)
    }

    /// Write `manifest.json` listing everything written so far. The manifest
    /// does not list itself.
    ///
    /// # Errors
    ///
    /// [`OutputError::Serialize`] or [`OutputError::Io`].
    pub fn finish(&self, run_id: Uuid, experiment: &str) -> Result<Manifest, OutputError> {
        let manifest = Manifest {
            run_id,
            experiment: experiment.to_string(),
            generated_at: Utc::now(),
            artifacts: self.artifacts.clone(),
        };
        let body =
            serde_json::to_vec_pretty(&manifest).map_err(|source| OutputError::Serialize {
                what: MANIFEST_FILE.to_string(),
                source,
            })?;
        write_atomic(&self.dir.join(MANIFEST_FILE), &body)?;
        Ok(manifest)
    }
}
