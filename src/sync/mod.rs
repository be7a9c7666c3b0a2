//! Incremental sync of one project against its seen-id record.
//!
//! Every project goes through a single [`decide`] step per sweep:
//!
//! - **Bootstrap**: nothing recorded yet. The whole remote id list becomes the
//!   baseline and nothing is announced, so newly tracked projects with history
//!   don't flood the channel.
//! - **Delta**: some remote ids are new. Each is fetched in remote order; ids
//!   whose fetch fails are still recorded so they are never retried.
//! - **NoChange**: every remote id is already recorded.
//!
//! The record is rewritten with `seen ∪ delta` after every decision, before
//! any notification goes out.

use std::collections::HashSet;

use crate::models::{Devlog, DevlogId, ProjectId};
use crate::source::{ClientError, SourceAdapter};
use crate::store::{SeenIdStore, StoreError};

/// What to do with a project this sweep, given what is recorded and what the remote reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Record these ids as the baseline without notifying.
    Bootstrap(Vec<DevlogId>),
    /// These ids are new and should be announced.
    Delta(Vec<DevlogId>),
    NoChange,
}

/// Compute the decision for a project. Ids keep the remote order; duplicates are dropped.
pub fn decide(seen: &[DevlogId], remote: &[DevlogId]) -> Decision {
    let mut known: HashSet<DevlogId> = seen.iter().copied().collect();
    let fresh: Vec<DevlogId> = remote.iter().copied().filter(|id| known.insert(*id)).collect();

    if seen.is_empty() {
        Decision::Bootstrap(fresh)
    } else if fresh.is_empty() {
        Decision::NoChange
    } else {
        Decision::Delta(fresh)
    }
}

/// Result of syncing one project.
#[derive(Debug)]
pub enum SyncOutcome {
    /// First observation; `baseline` ids were recorded silently.
    Bootstrap { title: String, baseline: usize },
    /// New devlogs to announce, in remote order. `skipped` ids could not be
    /// fetched and were recorded without a notification.
    Delta {
        title: String,
        devlogs: Vec<Devlog>,
        skipped: Vec<DevlogId>,
    },
    NoChange { title: String },
    /// The project itself could not be fetched; nothing was changed.
    FetchError(ClientError),
    /// The updated record could not be written; nothing will be announced.
    PersistError(StoreError),
}

impl SyncOutcome {
    /// Devlogs that should be announced.
    pub fn devlogs(&self) -> &[Devlog] {
        match self {
            SyncOutcome::Delta { devlogs, .. } => devlogs,
            _ => &[],
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            SyncOutcome::Bootstrap { title, .. }
            | SyncOutcome::Delta { title, .. }
            | SyncOutcome::NoChange { title } => Some(title),
            SyncOutcome::FetchError(_) | SyncOutcome::PersistError(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncEngine {
    store: SeenIdStore,
}

impl SyncEngine {
    pub fn new(store: SeenIdStore) -> Self {
        Self { store }
    }

    /// Bring one project's record up to date and return what is new.
    pub async fn sync_project(
        &self,
        source: &dyn SourceAdapter,
        project_id: ProjectId,
    ) -> SyncOutcome {
        let project = match source.fetch_project(project_id).await {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!(
                    project_id,
                    "Failed to fetch project, skipping this sweep: {}",
                    e
                );
                return SyncOutcome::FetchError(e);
            }
        };

        let mut seen = self.store.load(project_id);
        let decision = decide(&seen, &project.devlog_ids);

        let outcome = match decision {
            Decision::Bootstrap(baseline) => {
                let count = baseline.len();
                tracing::info!(project_id, count, "Recording baseline for {}", project.title);
                seen.extend(baseline);
                SyncOutcome::Bootstrap {
                    title: project.title,
                    baseline: count,
                }
            }
            Decision::Delta(delta) => {
                let mut devlogs = Vec::with_capacity(delta.len());
                let mut skipped = Vec::new();
                for &devlog_id in &delta {
                    match source.fetch_devlog(project_id, devlog_id).await {
                        Ok(devlog) => devlogs.push(devlog),
                        Err(e) => {
                            tracing::warn!(
                                project_id,
                                devlog_id,
                                "Failed to fetch devlog, it will not be announced: {}",
                                e
                            );
                            skipped.push(devlog_id);
                        }
                    }
                }
                seen.extend(delta);
                SyncOutcome::Delta {
                    title: project.title,
                    devlogs,
                    skipped,
                }
            }
            Decision::NoChange => SyncOutcome::NoChange {
                title: project.title,
            },
        };

        if let Err(e) = self.store.save(project_id, &seen) {
            tracing::error!(project_id, "Failed to persist seen ids: {}", e);
            return SyncOutcome::PersistError(e);
        }

        outcome
    }

    /// Drop a project's record so a later registration starts from a fresh baseline.
    pub fn forget(&self, project_id: ProjectId) -> Result<bool, StoreError> {
        self.store.remove(project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_bootstraps_with_full_remote_list() {
        assert_eq!(decide(&[], &[1, 2, 3]), Decision::Bootstrap(vec![1, 2, 3]));
    }

    #[test]
    fn empty_record_and_empty_remote_still_bootstraps() {
        assert_eq!(decide(&[], &[]), Decision::Bootstrap(vec![]));
    }

    #[test]
    fn new_ids_follow_remote_order() {
        assert_eq!(decide(&[1, 2, 3], &[1, 5, 2, 4, 3]), Decision::Delta(vec![5, 4]));
    }

    #[test]
    fn duplicate_remote_ids_appear_once() {
        assert_eq!(decide(&[1], &[1, 2, 2]), Decision::Delta(vec![2]));
    }

    #[test]
    fn known_ids_are_no_change() {
        assert_eq!(decide(&[1, 2, 3], &[1, 2, 3]), Decision::NoChange);
    }

    #[test]
    fn ids_missing_remotely_are_not_a_change() {
        assert_eq!(decide(&[1, 2, 3], &[2]), Decision::NoChange);
    }
}
