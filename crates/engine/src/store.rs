//! Persistence seams used by the delivery pipeline, plus their PostgreSQL
//! implementations.

use async_trait::async_trait;
use sqlx::PgPool;

use herald_common::error::AppError;
use herald_common::types::{DeliveryPreference, NewNotification, Notification, NotificationStatus, User};

use crate::user::USER_COLUMNS;

/// Storage of notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a notification in status `CREATED` and return the stored row.
    async fn create(&self, notification: &NewNotification) -> Result<Notification, AppError>;

    async fn get(&self, id: i64) -> Result<Notification, AppError>;

    async fn list(&self, ids: &[i64], limit: i64, offset: i64)
    -> Result<Vec<Notification>, AppError>;

    /// Move a `CREATED` notification to a terminal status.
    ///
    /// Fails with `NotFound` for an unknown id and `Internal` if the
    /// notification already left `CREATED`.
    async fn update_status(&self, id: i64, status: NotificationStatus) -> Result<(), AppError>;
}

/// Lookup of per-receiver delivery settings.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn delivery_preference(&self, user_id: i64) -> Result<DeliveryPreference, AppError>;
}

const NOTIFICATION_COLUMNS: &str =
    "id, sender_id, receiver_ids, message, media_content, status, date";

/// PostgreSQL-backed [`NotificationStore`].
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, notification: &NewNotification) -> Result<Notification, AppError> {
        let row: Notification = sqlx::query_as(&format!(
            r#"
            INSERT INTO notifications (sender_id, receiver_ids, message, media_content, date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.sender_id)
        .bind(&notification.receiver_ids)
        .bind(&notification.message)
        .bind(&notification.media_content)
        .bind(notification.date)
        .bind(NotificationStatus::Created.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Notification, AppError> {
        sqlx::query_as(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }

    async fn list(
        &self,
        ids: &[i64],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let rows: Vec<Notification> = sqlx::query_as(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE id = ANY($1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update_status(&self, id: i64, status: NotificationStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET status = $1 WHERE id = $2 AND status = $3")
            .bind(status.to_string())
            .bind(id)
            .bind(NotificationStatus::Created.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing updated: either the row is missing or it is already terminal.
        let current: Option<NotificationStatus> =
            sqlx::query_scalar("SELECT status FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Err(AppError::NotFound(format!("Notification {} not found", id))),
            Some(current) => Err(AppError::Internal(format!(
                "Notification {} is already {}, refusing to set {}",
                id, current, status
            ))),
        }
    }
}

/// PostgreSQL-backed [`UserStore`] reading the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn delivery_preference(&self, user_id: i64) -> Result<DeliveryPreference, AppError> {
        let user: User = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(DeliveryPreference::from(&user))
    }
}
