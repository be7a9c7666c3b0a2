//! Durable per-project record of devlog ids that have already been accounted for.
//!
//! Each project gets one JSON file, `{project_id}.json`, holding an array of ids
//! in the order they were first seen. Writes go to a sibling temp file and are
//! renamed into place so a reader never observes a half-written record.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{DevlogId, ProjectId};

/// Seen-id store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not determine cache directory")]
    NoCacheDir,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode seen ids: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SeenIdStore {
    dir: PathBuf,
}

impl SeenIdStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn record_path(&self, project_id: ProjectId) -> PathBuf {
        self.dir.join(format!("{}.json", project_id))
    }

    /// Load the ids recorded for a project.
    ///
    /// A missing record is an empty set. So is an unreadable or corrupt one:
    /// it is logged and gets overwritten by the next successful `save`.
    pub fn load(&self, project_id: ProjectId) -> Vec<DevlogId> {
        let path = self.record_path(project_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::error!(
                    project_id,
                    path = %path.display(),
                    "Failed to read seen ids: {}",
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(
                    project_id,
                    path = %path.display(),
                    "Corrupt seen-id record, treating as empty: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replace the record for a project with `ids`.
    pub fn save(&self, project_id: ProjectId, ids: &[DevlogId]) -> Result<(), StoreError> {
        let path = self.record_path(project_id);
        let tmp = self.dir.join(format!("{}.json.tmp", project_id));
        let content = serde_json::to_string_pretty(ids)?;

        fs::write(&tmp, content).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    /// Delete the record for a project. Returns whether one existed.
    pub fn remove(&self, project_id: ProjectId) -> Result<bool, StoreError> {
        let path = self.record_path(project_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// Platform cache directory for the service (`~/.cache/devlog-relay` on Linux).
pub fn default_cache_dir() -> Result<PathBuf, StoreError> {
    let dirs =
        directories::ProjectDirs::from("", "", "devlog-relay").ok_or(StoreError::NoCacheDir)?;
    Ok(dirs.cache_dir().to_path_buf())
}
