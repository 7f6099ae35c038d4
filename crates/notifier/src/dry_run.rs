use async_trait::async_trait;

use crate::{ChannelError, MessageChannel};

/// Channel that only logs outgoing messages.
///
/// Used when no bot token is configured, so the service still runs end to end.
#[derive(Debug, Default, Clone)]
pub struct DryRunChannel;

impl DryRunChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessageChannel for DryRunChannel {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send(
        &self,
        destination: i64,
        text: &str,
        media: Option<&str>,
        silent: bool,
    ) -> Result<(), ChannelError> {
        tracing::info!(
            destination,
            silent,
            has_media = media.is_some(),
            length = text.len(),
            "Dry-run delivery"
        );
        Ok(())
    }
}
