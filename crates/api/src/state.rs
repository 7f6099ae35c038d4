//! Shared application state for the Axum API server.

use std::sync::Arc;
use std::time::Duration;

use herald_common::config::AppConfig;
use herald_common::error::AppError;
use herald_engine::coordinator::{DeliveryCoordinator, DispatchConfig};
use herald_engine::store::{PgNotificationStore, PgUserStore};
use herald_notifier::MessageChannel;
use sqlx::PgPool;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub coordinator: Arc<DeliveryCoordinator>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        channel: Arc<dyn MessageChannel>,
    ) -> Result<Self, AppError> {
        let coordinator = DeliveryCoordinator::new(
            Arc::new(PgNotificationStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool.clone())),
            channel,
            DispatchConfig {
                concurrency: config.dispatch_concurrency,
                timeout: config.dispatch_timeout_secs.map(Duration::from_secs),
            },
        )?;

        Ok(Self {
            pool,
            config,
            coordinator: Arc::new(coordinator),
        })
    }
}
