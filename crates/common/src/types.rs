use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a notification.
///
/// A notification is stored as `Created` and moves exactly once to `Send`
/// (every receiver got the message) or `Problem` (at least one send failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationStatus {
    Created,
    Send,
    Problem,
}

impl NotificationStatus {
    /// Whether the status can no longer change.
    pub fn is_terminal(self) -> bool {
        !matches!(self, NotificationStatus::Created)
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Created => write!(f, "CREATED"),
            NotificationStatus::Send => write!(f, "SEND"),
            NotificationStatus::Problem => write!(f, "PROBLEM"),
        }
    }
}

/// Whether a user wants to be alerted when a message arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserNotificationStatus {
    Enabled,
    Disabled,
}

impl UserNotificationStatus {
    /// Messages to users with alerts disabled are delivered silently.
    pub fn is_muted(self) -> bool {
        matches!(self, UserNotificationStatus::Disabled)
    }
}

impl std::fmt::Display for UserNotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserNotificationStatus::Enabled => write!(f, "ENABLED"),
            UserNotificationStatus::Disabled => write!(f, "DISABLED"),
        }
    }
}

/// Role of a user within the organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "STUDENT"),
            UserRole::Teacher => write!(f, "TEACHER"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Account status of a user. New users start `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "ACTIVE"),
            UserStatus::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// A persisted notification addressed to one or more receivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_ids: Vec<i64>,
    pub message: String,
    pub media_content: Option<String>,
    pub status: NotificationStatus,
    pub date: DateTime<Utc>,
}

/// Fields required to insert a new notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub sender_id: i64,
    pub receiver_ids: Vec<i64>,
    pub message: String,
    pub media_content: Option<String>,
    pub date: DateTime<Utc>,
}

/// A user that can receive notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub role: UserRole,
    pub notification_status: UserNotificationStatus,
    pub user_group: String,
    pub firstname: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub mobile_phone: String,
    pub status: UserStatus,
}

/// How a single receiver should be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPreference {
    /// Telegram chat id of the receiver.
    pub destination: i64,
    /// Deliver without an audible alert.
    pub muted: bool,
}

impl From<&User> for DeliveryPreference {
    fn from(user: &User) -> Self {
        Self {
            destination: user.telegram_id,
            muted: user.notification_status.is_muted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&NotificationStatus::Send).unwrap(),
            "\"SEND\""
        );
        assert_eq!(
            serde_json::from_str::<NotificationStatus>("\"PROBLEM\"").unwrap(),
            NotificationStatus::Problem
        );
        assert_eq!(NotificationStatus::Created.to_string(), "CREATED");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!NotificationStatus::Created.is_terminal());
        assert!(NotificationStatus::Send.is_terminal());
        assert!(NotificationStatus::Problem.is_terminal());
    }

    #[test]
    fn test_preference_from_user() {
        let user = User {
            id: 1,
            telegram_id: 555,
            role: UserRole::Student,
            notification_status: UserNotificationStatus::Disabled,
            user_group: "A-1".to_string(),
            firstname: "Ann".to_string(),
            surname: "Lee".to_string(),
            patronymic: None,
            mobile_phone: "+100".to_string(),
            status: UserStatus::Active,
        };
        let pref = DeliveryPreference::from(&user);
        assert_eq!(pref.destination, 555);
        assert!(pref.muted);
    }

    #[test]
    fn test_user_enums_reject_unknown_values() {
        assert_eq!(
            serde_json::from_str::<UserRole>("\"TEACHER\"").unwrap(),
            UserRole::Teacher
        );
        assert!(serde_json::from_str::<UserRole>("\"JANITOR\"").is_err());
        assert!(serde_json::from_str::<UserStatus>("\"active\"").is_err());
        assert_eq!(UserStatus::default().to_string(), "ACTIVE");
        assert_eq!(UserRole::Admin.to_string(), "ADMIN");
    }
}
