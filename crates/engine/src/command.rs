//! Typed send command produced by a single validation pass.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use herald_common::error::AppError;
use herald_common::types::NewNotification;

/// Raw request to send a notification, as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub sender_id: i64,
    #[serde(default)]
    pub receiver_ids: Vec<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub media_content: Option<String>,
}

/// A validated notification ready for dispatch.
///
/// Only obtainable through [`SendNotificationRequest::validate`].
#[derive(Debug, Clone)]
pub struct SendNotification {
    sender_id: i64,
    receiver_ids: Vec<i64>,
    message: String,
    media_content: Option<String>,
}

impl SendNotificationRequest {
    /// Validate every field, failing on the first violation.
    ///
    /// Duplicate receiver ids are kept: each list entry is one delivery.
    pub fn validate(self) -> Result<SendNotification, AppError> {
        if self.sender_id <= 0 {
            return Err(AppError::Validation(
                "sender_id must be specified".to_string(),
            ));
        }
        if self.receiver_ids.is_empty() {
            return Err(AppError::Validation(
                "receiver_ids must be specified".to_string(),
            ));
        }
        if let Some(bad) = self.receiver_ids.iter().find(|id| **id <= 0) {
            return Err(AppError::Validation(format!(
                "receiver_ids must be positive, got {}",
                bad
            )));
        }
        if self.message.is_empty() {
            return Err(AppError::Validation("message must be specified".to_string()));
        }
        if matches!(self.media_content.as_deref(), Some("")) {
            return Err(AppError::Validation(
                "media_content must not be empty when present".to_string(),
            ));
        }

        Ok(SendNotification {
            sender_id: self.sender_id,
            receiver_ids: self.receiver_ids,
            message: self.message,
            media_content: self.media_content,
        })
    }
}

impl SendNotification {
    /// Convert into the row to insert, stamped with `date`.
    pub fn into_new_notification(self, date: DateTime<Utc>) -> NewNotification {
        NewNotification {
            sender_id: self.sender_id,
            receiver_ids: self.receiver_ids,
            message: self.message,
            media_content: self.media_content,
            date,
        }
    }
}
