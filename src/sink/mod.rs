//! Outbound messaging.

mod slack;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use slack::*;

/// A rendered notification: Block Kit blocks plus a plain-text fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub blocks: serde_json::Value,
}

/// Delivery errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error: {0}")]
    Api(String),
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn post_message(&self, channel: &str, message: &Message) -> Result<(), SinkError>;
}
