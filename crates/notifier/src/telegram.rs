//! Telegram Bot API channel.
//!
//! Plain messages go through `sendMessage`. When media is attached the message
//! is sent with `sendPhoto` and the text becomes the caption, unless the text
//! exceeds the Bot API caption limit; then the photo goes first without a
//! caption and the text follows as a regular message.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ChannelError, MessageChannel};

/// Longest caption `sendPhoto` accepts.
const CAPTION_LIMIT: usize = 1024;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    disable_notification: bool,
}

#[derive(Debug, Serialize)]
struct SendPhoto<'a> {
    chat_id: i64,
    photo: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    disable_notification: bool,
}

/// Response envelope shared by every Bot API method.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl ApiResponse {
    fn into_result(self) -> Result<(), ChannelError> {
        if self.ok {
            return Ok(());
        }
        Err(ChannelError::Api {
            code: self.error_code.unwrap_or_default(),
            description: self
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

/// Channel delivering messages through a Telegram bot.
#[derive(Clone)]
pub struct TelegramChannel {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl TelegramChannel {
    pub fn new(
        token: impl Into<String>,
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ChannelError::Config("Telegram bot token is empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<T: Serialize + ?Sized>(&self, method: &str, body: &T) -> Result<(), ChannelError> {
        let response: ApiResponse = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        response.into_result()
    }

    async fn send_message(&self, chat_id: i64, text: &str, silent: bool) -> Result<(), ChannelError> {
        self.call(
            "sendMessage",
            &SendMessage {
                chat_id,
                text,
                disable_notification: silent,
            },
        )
        .await
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: &str,
        caption: Option<&str>,
        silent: bool,
    ) -> Result<(), ChannelError> {
        self.call(
            "sendPhoto",
            &SendPhoto {
                chat_id,
                photo,
                caption,
                disable_notification: silent,
            },
        )
        .await
    }
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(
        &self,
        destination: i64,
        text: &str,
        media: Option<&str>,
        silent: bool,
    ) -> Result<(), ChannelError> {
        let result = match media {
            Some(photo) if text.chars().count() <= CAPTION_LIMIT => {
                self.send_photo(destination, photo, Some(text), silent).await
            }
            Some(photo) => {
                match self.send_photo(destination, photo, None, silent).await {
                    Ok(()) => self.send_message(destination, text, silent).await,
                    Err(e) => Err(e),
                }
            }
            None => self.send_message(destination, text, silent).await,
        };

        if let Err(e) = &result {
            tracing::warn!(destination, error = %e, "Telegram delivery failed");
        }
        result
    }
}
