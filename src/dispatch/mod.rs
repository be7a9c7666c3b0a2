//! Delivery of new devlogs to Slack, paced between projects.

mod render;

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;

pub use render::*;

use crate::models::{Devlog, ProjectId};
use crate::sink::MessageSink;

/// Delay after each project so the aggregate message rate stays within Slack's limits.
pub const DEFAULT_PACING: Duration = Duration::from_millis(2000);

/// Counts from delivering one project's batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn MessageSink>,
    pacing: Duration,
    offset: FixedOffset,
}

impl NotificationDispatcher {
    /// `offset` is the zone timestamps are rendered in.
    pub fn new(sink: Arc<dyn MessageSink>, pacing: Duration, offset: FixedOffset) -> Self {
        Self {
            sink,
            pacing,
            offset,
        }
    }

    /// Post one message per devlog, in order.
    ///
    /// A failed post is logged and the rest of the batch still goes out. The
    /// ids are already recorded as seen, so nothing is retried.
    pub async fn dispatch(
        &self,
        channel: &str,
        project_id: ProjectId,
        title: &str,
        devlogs: &[Devlog],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for devlog in devlogs {
            let message = render_devlog(project_id, title, devlog, &self.offset);
            match self.sink.post_message(channel, &message).await {
                Ok(()) => {
                    tracing::info!(project_id, devlog_id = devlog.id, channel, "Devlog announced");
                    report.sent += 1;
                }
                Err(e) => {
                    tracing::error!(
                        project_id,
                        devlog_id = devlog.id,
                        channel,
                        "Failed to post devlog: {}",
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Wait out the inter-project delay.
    pub async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }
}
