//! In-memory source and sink used by the sync and scheduler specs.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use devlog_relay::models::*;
use devlog_relay::sink::{Message, MessageSink, SinkError};
use devlog_relay::source::{ClientError, SourceAdapter, SourceFactory};

pub fn devlog(id: DevlogId, duration_seconds: u64) -> Devlog {
    Devlog {
        id,
        body: format!("Devlog number {}", id),
        duration_seconds,
        created_at: Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 0).unwrap(),
        updated_at: None,
        comments_count: 0,
        likes_count: 0,
        scrapbook_url: None,
    }
}

/// Source API double. Projects report whatever devlog ids are set for them;
/// every devlog id resolves to a record unless marked as failing.
#[derive(Default)]
pub struct FakeSource {
    projects: Mutex<HashMap<ProjectId, (String, Vec<DevlogId>)>>,
    durations: Mutex<HashMap<DevlogId, u64>>,
    failing_projects: Mutex<HashSet<ProjectId>>,
    failing_devlogs: Mutex<HashSet<DevlogId>>,
    devlog_fetches: Mutex<Vec<DevlogId>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_project(&self, id: ProjectId, title: &str, devlog_ids: &[DevlogId]) {
        self.projects
            .lock()
            .unwrap()
            .insert(id, (title.to_string(), devlog_ids.to_vec()));
    }

    pub fn set_duration(&self, devlog_id: DevlogId, seconds: u64) {
        self.durations.lock().unwrap().insert(devlog_id, seconds);
    }

    pub fn fail_project(&self, id: ProjectId) {
        self.failing_projects.lock().unwrap().insert(id);
    }

    pub fn fail_devlog(&self, id: DevlogId) {
        self.failing_devlogs.lock().unwrap().insert(id);
    }

    pub fn devlog_fetches(&self) -> Vec<DevlogId> {
        self.devlog_fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for FakeSource {
    async fn fetch_project(&self, project_id: ProjectId) -> Result<Project, ClientError> {
        if self.failing_projects.lock().unwrap().contains(&project_id) {
            return Err(ClientError::Server("503 Service Unavailable".to_string()));
        }
        let projects = self.projects.lock().unwrap();
        let (title, devlog_ids) = projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("project {}", project_id)))?;
        Ok(Project {
            id: project_id,
            title,
            description: None,
            repo_url: None,
            demo_url: None,
            readme_url: None,
            devlog_ids,
            created_at: None,
            updated_at: None,
        })
    }

    async fn fetch_devlog(
        &self,
        _project_id: ProjectId,
        devlog_id: DevlogId,
    ) -> Result<Devlog, ClientError> {
        self.devlog_fetches.lock().unwrap().push(devlog_id);
        if self.failing_devlogs.lock().unwrap().contains(&devlog_id) {
            return Err(ClientError::NotFound(format!("devlog {}", devlog_id)));
        }
        let duration = self
            .durations
            .lock()
            .unwrap()
            .get(&devlog_id)
            .copied()
            .unwrap_or(0);
        Ok(devlog(devlog_id, duration))
    }
}

/// Hands out pre-registered sources by credential and counts connections.
#[derive(Default)]
pub struct FakeFactory {
    sources: Mutex<HashMap<String, Arc<FakeSource>>>,
    connects: AtomicUsize,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, credential: &str, source: Arc<FakeSource>) {
        self.sources
            .lock()
            .unwrap()
            .insert(credential.to_string(), source);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl SourceFactory for FakeFactory {
    fn connect(&self, credential: &str) -> Result<Arc<dyn SourceAdapter>, ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.sources.lock().unwrap().get(credential) {
            Some(source) => Ok(source.clone() as Arc<dyn SourceAdapter>),
            None => Err(ClientError::MissingCredential),
        }
    }
}

/// Records every posted message; channels marked as failing reject posts.
#[derive(Default)]
pub struct FakeSink {
    posted: Mutex<Vec<(String, Message)>>,
    failing_channels: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
}

impl FakeSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_channel(&self, channel: &str) {
        self.failing_channels
            .lock()
            .unwrap()
            .insert(channel.to_string());
    }

    pub fn posted(&self) -> Vec<(String, Message)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Devlog ids announced, read back from the quoted body.
    pub fn announced_ids(&self) -> Vec<DevlogId> {
        self.posted()
            .iter()
            .filter_map(|(_, message)| {
                let body = message.blocks[1]["text"]["text"].as_str()?;
                body.rsplit(' ').next()?.parse().ok()
            })
            .collect()
    }
}

#[async_trait]
impl MessageSink for FakeSink {
    async fn post_message(&self, channel: &str, message: &Message) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_channels.lock().unwrap().contains(channel) {
            return Err(SinkError::Api("channel_not_found".to_string()));
        }
        self.posted
            .lock()
            .unwrap()
            .push((channel.to_string(), message.clone()));
        Ok(())
    }
}
