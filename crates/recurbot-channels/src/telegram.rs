//! Telegram Bot channel — delivers template posts via the Bot API.

use async_trait::async_trait;
use recurbot_core::config::TelegramConfig;
use recurbot_core::error::{RecurbotError, Result};
use recurbot_core::traits::MessagingGateway;
use recurbot_core::types::DeliveryResult;
use serde::Serialize;

/// Telegram gateway bound to one bot token and one chat.
pub struct TelegramGateway {
    config: TelegramConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    parse_mode: &'a str,
}

impl TelegramGateway {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Telegram client builder failed ({e}), using defaults");
                reqwest::Client::new()
            });
        Self { config, client }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// POST a Bot API method and decode whatever the API answers.
    ///
    /// Telegram reports rejections as `{"ok": false, ...}` with a 4xx
    /// status; those bodies are returned as results, not errors.
    async fn call<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<DeliveryResult> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| RecurbotError::Gateway(format!("Telegram {method} failed: {e}")))?;

        let status = response.status();
        let result: DeliveryResult = response.json().await.map_err(|e| {
            RecurbotError::Gateway(format!("Invalid Telegram {method} response ({status}): {e}"))
        })?;

        if !result.ok {
            tracing::warn!(
                "Telegram {method} rejected ({status}): {}",
                result.description.as_deref().unwrap_or("no description")
            );
        }
        Ok(result)
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, text: &str) -> Result<DeliveryResult> {
        let body = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: &self.config.parse_mode,
        };
        self.call("sendMessage", &body).await
    }

    async fn send_photo(&self, caption: &str, photo_url: &str) -> Result<DeliveryResult> {
        let body = SendPhotoRequest {
            chat_id: &self.config.chat_id,
            photo: photo_url,
            caption,
            parse_mode: &self.config.parse_mode,
        };
        self.call("sendPhoto", &body).await
    }
}
