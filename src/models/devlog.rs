use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DevlogId;

/// A devlog entry on a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Devlog {
    pub id: DevlogId,
    #[serde(default)]
    pub body: String,
    /// Time spent on the work this entry describes.
    #[serde(default)]
    pub duration_seconds: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub scrapbook_url: Option<String>,
}
