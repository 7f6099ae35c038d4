//! Selection of the outbound message channel from configuration.

use std::sync::Arc;
use std::time::Duration;

use herald_common::config::AppConfig;
use herald_notifier::{DryRunChannel, MessageChannel, TelegramChannel};

/// Build the Telegram channel, or a dry-run channel when no bot token is set.
pub fn channel_from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn MessageChannel>> {
    match &config.telegram_bot_token {
        Some(token) => {
            let channel = TelegramChannel::new(
                token.clone(),
                config.telegram_api_url.clone(),
                Duration::from_secs(config.telegram_timeout_secs),
            )?;
            tracing::info!(api_url = %config.telegram_api_url, "Telegram channel configured");
            Ok(Arc::new(channel))
        }
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, messages will only be logged");
            Ok(Arc::new(DryRunChannel::new()))
        }
    }
}
