//! HTTP client for the Flavortown API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::SourceAdapter;
use crate::models::{Devlog, DevlogId, Project, ProjectId};

/// Public Flavortown API.
pub const DEFAULT_URL: &str = "https://flavortown.hackclub.com/api/v1";

/// Header the API expects from third-party integrations.
const EXTENSION_HEADER: &str = "X-Flavortown-Ext-1865";

/// Upper bound on a single upstream request, shared by the source and Slack clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source API errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("An API key is required")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key invalid or revoked")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct FlavortownClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl FlavortownClient {
    /// Create a client authenticating with `api_key`. Blank keys are rejected.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Like [`FlavortownClient::new`], failing any request that takes longer than `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::MissingCredential);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(EXTENSION_HEADER, "true")
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
                StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
                _ => Err(ClientError::Server(format!("{}: {}", status, body))),
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for FlavortownClient {
    async fn fetch_project(&self, project_id: ProjectId) -> Result<Project, ClientError> {
        let response = self
            .get(&format!("/projects/{}", project_id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn fetch_devlog(
        &self,
        project_id: ProjectId,
        devlog_id: DevlogId,
    ) -> Result<Devlog, ClientError> {
        let response = self
            .get(&format!("/projects/{}/devlogs/{}", project_id, devlog_id))
            .send()
            .await?;
        self.handle_response(response).await
    }
}
