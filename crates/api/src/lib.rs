//! HTTP surface of the notification service.
//!
//! Endpoints:
//! - POST   /api/notifications: Validate, persist and deliver a notification
//! - GET    /api/notifications/{id}: Fetch one notification with its status
//! - GET    /api/notifications?ids=..&limit=..&offset=..: Fetch several notifications
//! - POST   /api/users: Register a receiver
//! - GET    /api/users/{id}, GET /api/users/telegram/{telegram_id}
//! - DELETE /api/users/{id}

pub mod channel;
pub mod routes;
pub mod state;
