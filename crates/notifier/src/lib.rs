//! Outbound message channels.
//!
//! A [`MessageChannel`] delivers one message to one destination. The engine
//! only depends on the trait; concrete channels live here:
//! - [`TelegramChannel`] talks to the Telegram Bot API over HTTPS
//! - [`DryRunChannel`] logs messages instead of sending them

pub mod dry_run;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

pub use dry_run::DryRunChannel;
pub use telegram::TelegramChannel;

/// Failure to deliver a single message.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A messaging channel able to deliver a text (and optional media) to a destination.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Channel name used in logs.
    fn name(&self) -> &str;

    /// Send `text` to `destination`.
    ///
    /// `silent` asks the channel to deliver without alerting the receiver.
    async fn send(
        &self,
        destination: i64,
        text: &str,
        media: Option<&str>,
        silent: bool,
    ) -> Result<(), ChannelError>;
}
