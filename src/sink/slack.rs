//! Slack Web API sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{Message, MessageSink, SinkError};
use crate::source::DEFAULT_TIMEOUT;

pub const DEFAULT_SLACK_URL: &str = "https://slack.com/api";

/// Envelope every Slack Web API method responds with.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlackSink {
    base_url: String,
    bot_token: String,
    client: Client,
}

impl SlackSink {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Result<Self, SinkError> {
        Self::with_timeout(base_url, bot_token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl MessageSink for SlackSink {
    async fn post_message(&self, channel: &str, message: &Message) -> Result<(), SinkError> {
        let body = serde_json::json!({
            "channel": channel,
            "text": message.text,
            "blocks": message.blocks,
        });

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<SlackResponse>()
            .await?;

        if !response.ok {
            return Err(SinkError::Api(
                response.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        Ok(())
    }
}
