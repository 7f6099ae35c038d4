use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Boxed error source used where the concrete failure type varies by backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Common error types used across the application.
///
/// Every failure surfaced to a caller is classified as exactly one variant.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[source] BoxError),

    /// At least one send of notification `notification_id` failed.
    ///
    /// `compensation` holds the failure of the follow-up PROBLEM status write,
    /// if that write also failed.
    #[error("{}", delivery_message(.notification_id, .failed, .total, .source, .compensation))]
    Delivery {
        notification_id: i64,
        failed: usize,
        total: usize,
        #[source]
        source: BoxError,
        compensation: Option<Box<AppError>>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn delivery_message(
    notification_id: &i64,
    failed: &usize,
    total: &usize,
    source: &BoxError,
    compensation: &Option<Box<AppError>>,
) -> String {
    let mut msg = format!(
        "Delivery error: {failed} of {total} sends failed for notification {notification_id}: {source}"
    );
    if let Some(c) = compensation {
        msg.push_str(&format!(" (status update to PROBLEM also failed: {c})"));
    }
    msg
}

impl AppError {
    pub fn persistence(source: impl Into<BoxError>) -> Self {
        AppError::Persistence(source.into())
    }

    /// Short classification name, stable for logs and API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Persistence(_) => "persistence",
            AppError::Delivery { .. } => "delivery",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Persistence(Box::new(err))
    }
}

// Extractor rejections are client input errors and share the JSON error body.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Delivery { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = json!({ "error": message, "kind": self.kind() });
        (status, Json(body)).into_response()
    }
}
