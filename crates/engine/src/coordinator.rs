//! Delivery coordinator: drives one notification from creation to a terminal status.
//!
//! Steps for every dispatch:
//! 1. Persist the notification as `CREATED` (failure aborts before any send)
//! 2. Queue one delivery job per receiver entry on a fresh [`BoundedDispatcher`]
//! 3. Each job resolves the receiver's delivery preference and sends the message
//! 4. Reconcile: `SEND` if every job succeeded, `PROBLEM` otherwise
//!
//! Policies:
//! - A failed preference lookup fails only that receiver's job.
//! - Duplicate receiver ids are sent to once per list entry.
//! - Nothing is retried.
//! - If the `PROBLEM` write fails, the delivery error is still returned and the
//!   write failure is attached to it as `compensation`.
//! - If the `SEND` write fails, the persistence error is returned even though
//!   every message went out; the row stays `CREATED`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use herald_common::error::{AppError, BoxError};
use herald_common::types::{Notification, NotificationStatus};
use herald_notifier::{ChannelError, MessageChannel};

use crate::command::{SendNotification, SendNotificationRequest};
use crate::dispatcher::{BoundedDispatcher, DispatcherError, JobFailure};
use crate::store::{NotificationStore, UserStore};

/// Tuning for a coordinator.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Maximum number of concurrent sends for one notification.
    pub concurrency: usize,
    /// Deadline for the whole fan-out; unfinished sends are abandoned.
    pub timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: None,
        }
    }
}

/// Failure of the delivery to one receiver.
#[derive(Debug, Error)]
pub enum DeliveryFailure {
    #[error("receiver {receiver_id}: preference lookup failed: {source}")]
    Lookup {
        receiver_id: i64,
        #[source]
        source: AppError,
    },

    #[error("receiver {receiver_id}: send failed: {source}")]
    Send {
        receiver_id: i64,
        #[source]
        source: ChannelError,
    },
}

impl DeliveryFailure {
    pub fn receiver_id(&self) -> i64 {
        match self {
            DeliveryFailure::Lookup { receiver_id, .. } => *receiver_id,
            DeliveryFailure::Send { receiver_id, .. } => *receiver_id,
        }
    }
}

/// The dispatch deadline passed before every send finished.
///
/// `last` is the most recent real send failure seen before the deadline, if any.
#[derive(Debug, Error)]
#[error(
    "delivery deadline exceeded after {completed} of {total} sends finished{}",
    last_failure_suffix(.last)
)]
pub struct DeadlineExceeded {
    pub completed: usize,
    pub total: usize,
    #[source]
    pub last: Option<BoxError>,
}

fn last_failure_suffix(last: &Option<BoxError>) -> String {
    match last {
        Some(e) => format!("; last failure: {}", e),
        None => String::new(),
    }
}

/// Result of a fully successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// The notification, in its final `SEND` status.
    pub notification: Notification,
    /// Number of messages delivered.
    pub delivered: usize,
}

/// Orchestrates persistence, fan-out and status reconciliation.
pub struct DeliveryCoordinator {
    notifications: Arc<dyn NotificationStore>,
    users: Arc<dyn UserStore>,
    channel: Arc<dyn MessageChannel>,
    config: DispatchConfig,
}

impl DeliveryCoordinator {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        users: Arc<dyn UserStore>,
        channel: Arc<dyn MessageChannel>,
        config: DispatchConfig,
    ) -> Result<Self, AppError> {
        if config.concurrency == 0 {
            return Err(AppError::Config(
                "dispatch concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            notifications,
            users,
            channel,
            config,
        })
    }

    pub fn notifications(&self) -> &Arc<dyn NotificationStore> {
        &self.notifications
    }

    /// Validate a raw request, then dispatch it.
    pub async fn submit(&self, request: SendNotificationRequest) -> Result<DispatchOutcome, AppError> {
        let command = request.validate()?;
        self.dispatch(command).await
    }

    /// Persist and deliver a validated notification.
    pub async fn dispatch(&self, command: SendNotification) -> Result<DispatchOutcome, AppError> {
        let mut notification = self
            .notifications
            .create(&command.into_new_notification(Utc::now()))
            .await?;

        if notification.status != NotificationStatus::Created {
            return Err(AppError::Internal(format!(
                "Notification {} was stored as {} instead of CREATED",
                notification.id, notification.status
            )));
        }

        let total = notification.receiver_ids.len();
        tracing::info!(
            notification_id = notification.id,
            sender_id = notification.sender_id,
            receivers = total,
            concurrency = self.config.concurrency,
            channel = self.channel.name(),
            "Notification created, starting delivery"
        );

        let dispatcher = self.build_dispatcher(&notification)?;
        let run = match self.config.timeout {
            Some(timeout) => dispatcher.run_until(tokio::time::sleep(timeout)).await,
            None => dispatcher.run().await,
        };

        match run {
            Ok(()) => {
                if let Err(e) = self
                    .notifications
                    .update_status(notification.id, NotificationStatus::Send)
                    .await
                {
                    tracing::error!(
                        notification_id = notification.id,
                        error = %e,
                        "All messages delivered but SEND status could not be stored"
                    );
                    return Err(e);
                }

                notification.status = NotificationStatus::Send;
                tracing::info!(
                    notification_id = notification.id,
                    delivered = total,
                    "Notification delivered"
                );

                Ok(DispatchOutcome {
                    notification,
                    delivered: total,
                })
            }
            Err(err) => Err(self.reconcile_failure(notification.id, err).await),
        }
    }

    fn build_dispatcher(
        &self,
        notification: &Notification,
    ) -> Result<BoundedDispatcher<DeliveryFailure>, AppError> {
        let mut dispatcher = BoundedDispatcher::new(self.config.concurrency)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let message: Arc<str> = Arc::from(notification.message.as_str());
        let media: Option<Arc<str>> = notification.media_content.as_deref().map(Arc::from);

        for &receiver_id in &notification.receiver_ids {
            let users = self.users.clone();
            let channel = self.channel.clone();
            let message = message.clone();
            let media = media.clone();

            dispatcher.add_job(move || async move {
                let preference = users
                    .delivery_preference(receiver_id)
                    .await
                    .map_err(|source| DeliveryFailure::Lookup {
                        receiver_id,
                        source,
                    })?;

                channel
                    .send(
                        preference.destination,
                        &message,
                        media.as_deref(),
                        preference.muted,
                    )
                    .await
                    .map_err(|source| DeliveryFailure::Send {
                        receiver_id,
                        source,
                    })
            });
        }

        Ok(dispatcher)
    }

    /// Mark the notification as `PROBLEM` and build the error for the caller.
    async fn reconcile_failure(
        &self,
        notification_id: i64,
        err: DispatcherError<DeliveryFailure>,
    ) -> AppError {
        let (failed, total, source): (usize, usize, BoxError) = match err {
            DispatcherError::JobsFailed {
                last,
                failed,
                total,
            } => {
                tracing::warn!(notification_id, failed, total, "Delivery failed");
                (failed, total, failure_source(notification_id, last))
            }
            DispatcherError::Cancelled {
                completed,
                total,
                failed,
                last,
            } => {
                let unfinished = total - completed;
                tracing::warn!(
                    notification_id,
                    completed,
                    failed,
                    unfinished,
                    total,
                    "Delivery deadline exceeded"
                );
                let source: BoxError = Box::new(DeadlineExceeded {
                    completed,
                    total,
                    last: last.map(|failure| failure_source(notification_id, failure)),
                });
                (failed + unfinished, total, source)
            }
        };

        let compensation = match self
            .notifications
            .update_status(notification_id, NotificationStatus::Problem)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    notification_id,
                    error = %e,
                    "Failed to store PROBLEM status after delivery failure"
                );
                Some(Box::new(e))
            }
        };

        AppError::Delivery {
            notification_id,
            failed,
            total,
            source,
            compensation,
        }
    }
}

/// Log one recorded job failure and turn it into the error reported to the caller.
fn failure_source(notification_id: i64, failure: JobFailure<DeliveryFailure>) -> BoxError {
    match failure {
        JobFailure::Failed(failure) => {
            tracing::warn!(
                notification_id,
                receiver_id = failure.receiver_id(),
                error = %failure,
                "Delivery to receiver failed"
            );
            Box::new(failure)
        }
        JobFailure::Panicked(msg) => {
            tracing::error!(notification_id, panic = %msg, "Delivery job panicked");
            Box::new(AppError::Internal(format!("delivery job panicked: {}", msg)))
        }
    }
}
