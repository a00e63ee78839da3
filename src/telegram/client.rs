use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::workers::broadcaster::{Deliver, DeliveryError};

/// Long-poll wait passed to getUpdates, in seconds
const POLL_TIMEOUT_SECS: u64 = 25;

/// Client for the Telegram Bot API
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

/// Standard Telegram response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// An inbound update from getUpdates
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    /// Create a new client for the given API host and bot token
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    /// Send a text message to a chat
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/sendMessage", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;

        let body: ApiResponse<serde_json::Value> = response.json().await?;

        if !body.ok {
            return Err(DeliveryError::Api(
                body.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        debug!("Message sent to chat {}", chat_id);
        Ok(())
    }

    /// Fetch pending updates at or after `offset` (long polling)
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("offset", offset), ("timeout", POLL_TIMEOUT_SECS as i64)])
            .send()
            .await
            .context("Failed to fetch updates")?;

        let body: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .context("Failed to parse updates response")?;

        if !body.ok {
            anyhow::bail!(
                "getUpdates rejected: {}",
                body.description.unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(body.result.unwrap_or_default())
    }
}

#[async_trait]
impl Deliver for TelegramClient {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.send_message(chat_id, text).await
    }
}
