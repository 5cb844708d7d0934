use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use super::AlertSink;
use super::error::AlertError;

/// Discord REST API v10.
pub const DEFAULT_API_URL: &str = "https://discord.com/api/v10";

/// Discord caps message content at 2000 characters.
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

/// Posts alerts to a Discord channel through the bot REST API.
pub struct DiscordClient {
    bot_token: String,
    channel_id: String,
    client: Client,
    base_url: String,
}

impl DiscordClient {
    /// Create a client for `channel_id` against the API at `base_url`.
    pub fn with_base_url(
        bot_token: String,
        channel_id: String,
        base_url: String,
    ) -> Result<Self, AlertError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            bot_token,
            channel_id,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn channel_url(&self) -> String {
        format!("{}/channels/{}", self.base_url, self.channel_id)
    }

    /// Check that the token is accepted and the channel is reachable.
    pub async fn verify(&self) -> Result<(), AlertError> {
        let response = self
            .client
            .get(self.channel_url())
            .header("authorization", format!("Bot {}", self.bot_token))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AlertError::ChannelNotFound(self.channel_id.clone()));
        }
        check_status(response).await?;

        info!(channel = %self.channel_id, "discord channel verified");
        Ok(())
    }
}

impl AlertSink for DiscordClient {
    async fn send_alert(&self, message: &str) -> Result<(), AlertError> {
        let content = truncate_chars(message, MAX_CONTENT_CHARS);
        let response = self
            .client
            .post(format!("{}/messages", self.channel_url()))
            .header("authorization", format!("Bot {}", self.bot_token))
            .json(&CreateMessage { content })
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AlertError::ChannelNotFound(self.channel_id.clone()));
        }
        check_status(response).await?;

        debug!(channel = %self.channel_id, "alert delivered");
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, AlertError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        // Discord sends fractional seconds.
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok())
            .map(|secs| (secs * 1000.0).ceil() as u64)
            .unwrap_or(1000);
        return Err(AlertError::RateLimited {
            retry_after_ms: retry_after,
        });
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(AlertError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
