//! Read-only access to the remote project/devlog API.
//!
//! The sync only needs two operations from the source, captured by
//! [`SourceAdapter`]. [`SourceFactory`] builds one adapter per credential so the
//! scheduler can cache them.

mod client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use client::*;

use crate::models::{Devlog, DevlogId, Project, ProjectId};

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch a project's title and its authoritative devlog id list.
    async fn fetch_project(&self, project_id: ProjectId) -> Result<Project, ClientError>;

    /// Fetch the full record for one devlog.
    async fn fetch_devlog(
        &self,
        project_id: ProjectId,
        devlog_id: DevlogId,
    ) -> Result<Devlog, ClientError>;
}

/// Builds a [`SourceAdapter`] bound to one credential.
pub trait SourceFactory: Send + Sync {
    fn connect(&self, credential: &str) -> Result<Arc<dyn SourceAdapter>, ClientError>;
}

/// Factory producing [`FlavortownClient`]s against a fixed base URL.
#[derive(Debug, Clone)]
pub struct FlavortownFactory {
    base_url: String,
    timeout: Duration,
}

impl FlavortownFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Per-request timeout for every client this factory builds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SourceFactory for FlavortownFactory {
    fn connect(&self, credential: &str) -> Result<Arc<dyn SourceAdapter>, ClientError> {
        Ok(Arc::new(FlavortownClient::with_timeout(
            self.base_url.clone(),
            credential,
            self.timeout,
        )?))
    }
}
