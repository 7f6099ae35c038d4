//! Notification routes: dispatch and queries.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use herald_common::error::AppError;
use herald_common::types::{Notification, NotificationStatus};
use herald_engine::command::SendNotificationRequest;
use herald_engine::notification::{ListNotificationsParams, NotificationPage, NotificationService};

use super::parse_id_list;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", post(send_notification))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}", get(get_notification))
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub notification_id: i64,
    pub status: NotificationStatus,
    pub delivered: usize,
}

/// Query string for listing; `ids` is a comma-separated list.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub ids: String,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl ListNotificationsQuery {
    fn into_params(self) -> Result<ListNotificationsParams, AppError> {
        Ok(ListNotificationsParams {
            ids: parse_id_list(&self.ids, "notification")?,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// POST /api/notifications: Persist a notification and deliver it to every receiver.
async fn send_notification(
    State(state): State<AppState>,
    payload: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Result<Json<SendNotificationResponse>, AppError> {
    let Json(request) = payload?;
    let outcome = state.coordinator.submit(request).await?;
    Ok(Json(SendNotificationResponse {
        notification_id: outcome.notification.id,
        status: outcome.notification.status,
        delivered: outcome.delivered,
    }))
}

/// GET /api/notifications/{id}: Fetch a notification and its delivery status.
async fn get_notification(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Notification>, AppError> {
    let Path(id) = id?;
    let notification =
        NotificationService::get(state.coordinator.notifications().as_ref(), id).await?;
    Ok(Json(notification))
}

/// GET /api/notifications?ids=1,2&limit=10&offset=0: Fetch several notifications.
async fn list_notifications(
    State(state): State<AppState>,
    query: Result<Query<ListNotificationsQuery>, QueryRejection>,
) -> Result<Json<NotificationPage>, AppError> {
    let Query(query) = query?;
    let params = query.into_params()?;
    let page = NotificationService::list(state.coordinator.notifications().as_ref(), &params).await?;
    Ok(Json(page))
}
