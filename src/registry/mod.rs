//! Credential registry: which credential watches which projects for which channel.
//!
//! The registry lives in `apiKeys.json` inside the cache directory as a JSON
//! object keyed by credential. The sweep only ever calls [`CredentialRegistry::load`];
//! everything else here is administrative glue driven by the HTTP API.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::models::{ProjectId, RegisterInput, Registration, Registrations};

const REGISTRY_FILE: &str = "apiKeys.json";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Registry file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Credential is already registered to another channel")]
    CredentialInUse,

    #[error("Registry lock poisoned by a panicked writer")]
    LockPoisoned,
}

#[derive(Debug, Clone)]
pub struct CredentialRegistry {
    path: PathBuf,
    // Serializes read-modify-write cycles from concurrent admin requests.
    write_lock: Arc<Mutex<()>>,
}

impl CredentialRegistry {
    /// Registry stored as `apiKeys.json` under `dir`.
    pub fn open(dir: &Path) -> Self {
        Self {
            path: dir.join(REGISTRY_FILE),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a fresh snapshot of the registry. A missing file is an empty registry.
    ///
    /// Never writes, so sweeps can read concurrently with admin updates.
    pub fn load(&self) -> Result<Registrations, RegistryError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Registrations::new()),
            Err(source) => Err(io_error(&self.path, source)),
        }
    }

    /// Replace the registry file. The new content is written to a sibling temp
    /// file and renamed over `apiKeys.json`.
    pub fn save(&self, registrations: &Registrations) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        let content = serde_json::to_string_pretty(registrations)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, content).map_err(|source| io_error(&tmp, source))?;
        fs::rename(&tmp, &self.path).map_err(|source| io_error(&self.path, source))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, RegistryError> {
        self.write_lock.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Number of registered credentials.
    pub fn count(&self) -> Result<usize, RegistryError> {
        Ok(self.load()?.len())
    }

    /// Register a credential, or add projects to one already registered for the same channel.
    pub fn register(&self, input: RegisterInput) -> Result<Registration, RegistryError> {
        let credential = input.credential.trim();
        let channel = input.channel.trim();
        if credential.is_empty() {
            return Err(RegistryError::Invalid("credential is required".to_string()));
        }
        if channel.is_empty() {
            return Err(RegistryError::Invalid("channel is required".to_string()));
        }
        let projects = input
            .projects
            .iter()
            .map(|p| parse_project_id(p).map(|id| id.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        let _guard = self.lock()?;
        let mut registrations = self.load()?;

        let entry = registrations
            .entry(credential.to_string())
            .or_insert_with(|| Registration {
                channel: channel.to_string(),
                projects: Vec::new(),
            });
        if entry.channel != channel {
            return Err(RegistryError::CredentialInUse);
        }
        for project in projects {
            if !entry.projects.contains(&project) {
                entry.projects.push(project);
            }
        }
        let registration = entry.clone();

        self.save(&registrations)?;
        tracing::info!(channel, "Registered {} project(s)", registration.projects.len());
        Ok(registration)
    }

    /// Move the registration owned by `channel` to a new credential.
    ///
    /// Returns `false` when no registration belongs to the channel.
    pub fn rekey_channel(&self, channel: &str, credential: &str) -> Result<bool, RegistryError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(RegistryError::Invalid("credential is required".to_string()));
        }

        let _guard = self.lock()?;
        let mut registrations = self.load()?;

        let Some(index) = registrations.values().position(|r| r.channel == channel) else {
            return Ok(false);
        };
        let old = registrations
            .get_index(index)
            .map(|(key, _)| key.clone())
            .unwrap_or_default();
        if old == credential {
            return Ok(true);
        }
        if registrations.contains_key(credential) {
            return Err(RegistryError::CredentialInUse);
        }

        if let Some((_, registration)) = registrations.shift_remove_index(index) {
            registrations.shift_insert(index, credential.to_string(), registration);
        }
        self.save(&registrations)?;
        tracing::info!(channel, "Credential re-keyed");
        Ok(true)
    }

    /// Stop tracking a project under every credential.
    ///
    /// Credentials left without projects are dropped. Returns `false` when no
    /// credential tracked the project. The project's seen-id record is the
    /// caller's to delete.
    pub fn remove_project(&self, project_id: ProjectId) -> Result<bool, RegistryError> {
        let target = project_id.to_string();

        let _guard = self.lock()?;
        let mut registrations = self.load()?;

        let mut found = false;
        for registration in registrations.values_mut() {
            let before = registration.projects.len();
            registration.projects.retain(|p| p.trim() != target);
            found |= registration.projects.len() != before;
        }
        if !found {
            return Ok(false);
        }
        registrations.retain(|_, r| !r.projects.is_empty());

        self.save(&registrations)?;
        tracing::info!(project_id, "Project removed from registry");
        Ok(true)
    }

    /// Drop every registration that notifies `channel`. Returns whether any existed.
    pub fn remove_channel(&self, channel: &str) -> Result<bool, RegistryError> {
        let _guard = self.lock()?;
        let mut registrations = self.load()?;

        let before = registrations.len();
        registrations.retain(|_, r| r.channel != channel);
        if registrations.len() == before {
            return Ok(false);
        }

        self.save(&registrations)?;
        tracing::info!(channel, "Channel removed from registry");
        Ok(true)
    }
}

fn io_error(path: &Path, source: io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Parse a project id as stored in the registry or given by an admin.
pub fn parse_project_id(raw: &str) -> Result<ProjectId, RegistryError> {
    raw.trim()
        .parse()
        .map_err(|_| RegistryError::Invalid(format!("project id must be a number, got {:?}", raw)))
}
