pub mod health;
pub mod notifications;
pub mod users;

use axum::Router;

use herald_common::error::AppError;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(notifications::router())
        .merge(users::router())
        .with_state(state)
}

/// Parse a comma-separated id list such as `1, 2,,3`; blank entries are skipped.
pub(crate) fn parse_id_list(raw: &str, what: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::Validation(format!("invalid {} id '{}'", what, s)))
        })
        .collect()
}
