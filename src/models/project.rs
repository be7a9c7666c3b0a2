use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DevlogId, ProjectId};

/// A project hosted on the source API.
///
/// Only `title` and `devlog_ids` drive the sync; the remaining fields are
/// carried along so the full response round-trips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub readme_url: Option<String>,
    /// Every devlog id the project currently has, in the order the API lists them.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub devlog_ids: Vec<DevlogId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<DevlogId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<DevlogId>>::deserialize(deserializer)?.unwrap_or_default())
}
