//! Sweep scheduling.
//!
//! A sweep walks every registered credential and each of its projects in
//! registration order, one at a time. [`Scheduler::run`] performs a sweep
//! immediately and then re-arms the timer only once a sweep has finished, so
//! sweeps never overlap. The scheduler is driven through `&mut self`, which is
//! what keeps the seen-id store and the client cache single-writer.
//!
//! A project removed from the registry while a sweep is already holding it
//! would have its record written back after the removal. Each sweep ends by
//! re-reading the registry and forgetting any record it wrote for a project
//! that is no longer registered.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::NotificationDispatcher;
use crate::models::ProjectId;
use crate::registry::{parse_project_id, CredentialRegistry};
use crate::source::{ClientError, SourceAdapter, SourceFactory};
use crate::sync::{SyncEngine, SyncOutcome};

/// Time between the end of one sweep and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Sweeping,
}

/// Source clients keyed by credential.
///
/// Built lazily on first use and kept for the life of the process.
pub struct ClientCache {
    factory: Arc<dyn SourceFactory>,
    clients: HashMap<String, Arc<dyn SourceAdapter>>,
}

impl ClientCache {
    pub fn new(factory: Arc<dyn SourceFactory>) -> Self {
        Self {
            factory,
            clients: HashMap::new(),
        }
    }

    pub fn get_or_connect(
        &mut self,
        credential: &str,
    ) -> Result<Arc<dyn SourceAdapter>, ClientError> {
        if let Some(client) = self.clients.get(credential) {
            return Ok(client.clone());
        }
        let client = self.factory.connect(credential)?;
        self.clients.insert(credential.to_string(), client.clone());
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Tally of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub projects_checked: usize,
    pub baselines: usize,
    pub notified: usize,
    pub delivery_failures: usize,
    /// Devlogs recorded as seen without being announced because their fetch failed.
    pub skipped_devlogs: usize,
    /// Projects or credentials that could not be processed this sweep.
    pub failures: usize,
}

pub struct Scheduler {
    registry: CredentialRegistry,
    engine: SyncEngine,
    dispatcher: NotificationDispatcher,
    clients: ClientCache,
    interval: Duration,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(
        registry: CredentialRegistry,
        engine: SyncEngine,
        dispatcher: NotificationDispatcher,
        factory: Arc<dyn SourceFactory>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            engine,
            dispatcher,
            clients: ClientCache::new(factory),
            interval,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn clients(&self) -> &ClientCache {
        &self.clients
    }

    /// Sweep now, then every `interval` after the previous sweep completes. Never returns.
    pub async fn run(mut self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Scheduler started");
        loop {
            self.sweep().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass over every credential and project in the registry.
    ///
    /// Failures are contained to the credential or project they hit; whatever
    /// failed is simply tried again next sweep.
    pub async fn sweep(&mut self) -> SweepReport {
        self.state = SchedulerState::Sweeping;
        let report = self.sweep_registrations().await;
        self.state = SchedulerState::Idle;

        tracing::info!(
            projects = report.projects_checked,
            baselines = report.baselines,
            notified = report.notified,
            delivery_failures = report.delivery_failures,
            skipped_devlogs = report.skipped_devlogs,
            failures = report.failures,
            "Sweep finished"
        );
        report
    }

    async fn sweep_registrations(&mut self) -> SweepReport {
        let mut report = SweepReport::default();
        let mut written: HashSet<ProjectId> = HashSet::new();

        let registrations = match self.registry.load() {
            Ok(registrations) => registrations,
            Err(e) => {
                tracing::error!("Failed to load credential registry: {}", e);
                report.failures += 1;
                return report;
            }
        };

        for (credential, registration) in &registrations {
            let source = match self.clients.get_or_connect(credential) {
                Ok(source) => source,
                Err(e) => {
                    tracing::error!(
                        channel = %registration.channel,
                        "Failed to create source client: {}",
                        e
                    );
                    report.failures += 1;
                    continue;
                }
            };

            for raw_id in &registration.projects {
                let project_id = match parse_project_id(raw_id) {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!(
                            channel = %registration.channel,
                            "Skipping registry entry: {}",
                            e
                        );
                        report.failures += 1;
                        continue;
                    }
                };

                report.projects_checked += 1;
                let outcome = self.engine.sync_project(source.as_ref(), project_id).await;
                if outcome.title().is_some() {
                    written.insert(project_id);
                }
                match &outcome {
                    SyncOutcome::Bootstrap { .. } => report.baselines += 1,
                    SyncOutcome::Delta { title, devlogs, skipped } => {
                        report.skipped_devlogs += skipped.len();
                        let sent = self
                            .dispatcher
                            .dispatch(&registration.channel, project_id, title, devlogs)
                            .await;
                        report.notified += sent.sent;
                        report.delivery_failures += sent.failed;
                    }
                    SyncOutcome::NoChange { .. } => {}
                    SyncOutcome::FetchError(_) | SyncOutcome::PersistError(_) => {
                        report.failures += 1
                    }
                }

                self.dispatcher.pace().await;
            }
        }

        self.forget_unregistered(&written);
        report
    }

    fn forget_unregistered(&self, written: &HashSet<ProjectId>) {
        if written.is_empty() {
            return;
        }
        let registrations = match self.registry.load() {
            Ok(registrations) => registrations,
            Err(e) => {
                tracing::warn!("Could not re-read registry after sweep: {}", e);
                return;
            }
        };
        let registered: HashSet<ProjectId> = registrations
            .values()
            .flat_map(|r| r.projects.iter())
            .filter_map(|raw| parse_project_id(raw).ok())
            .collect();

        for &project_id in written.difference(&registered) {
            match self.engine.forget(project_id) {
                Ok(_) => tracing::info!(project_id, "Forgot record of project removed mid-sweep"),
                Err(e) => tracing::error!(project_id, "Failed to forget removed project: {}", e),
            }
        }
    }
}
