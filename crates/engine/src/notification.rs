//! Read access to stored notifications.

use serde::{Deserialize, Serialize};

use herald_common::error::AppError;
use herald_common::types::Notification;

use crate::store::NotificationStore;

/// Parameters for listing notifications by id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListNotificationsParams {
    pub ids: Vec<i64>,
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// A page of notifications with the paging parameters echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub limit: i64,
    pub offset: i64,
    pub count: usize,
}

/// Service layer for notification queries.
pub struct NotificationService;

impl NotificationService {
    /// Get a single notification by id.
    pub async fn get(store: &dyn NotificationStore, id: i64) -> Result<Notification, AppError> {
        if id <= 0 {
            return Err(AppError::Validation(
                "notification_id must be specified".to_string(),
            ));
        }
        store.get(id).await
    }

    /// List notifications whose id is in `params.ids`.
    pub async fn list(
        store: &dyn NotificationStore,
        params: &ListNotificationsParams,
    ) -> Result<NotificationPage, AppError> {
        if params.ids.is_empty() {
            return Err(AppError::Validation(
                "notification_ids must be specified".to_string(),
            ));
        }
        if params.limit <= 0 {
            return Err(AppError::Validation("limit must be specified".to_string()));
        }
        if params.offset < 0 {
            return Err(AppError::Validation(
                "offset must not be negative".to_string(),
            ));
        }

        let notifications = store
            .list(&params.ids, params.limit, params.offset)
            .await?;

        Ok(NotificationPage {
            count: notifications.len(),
            notifications,
            limit: params.limit,
            offset: params.offset,
        })
    }
}
