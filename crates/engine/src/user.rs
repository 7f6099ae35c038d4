//! User service with CRUD operations for notification receivers.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use herald_common::error::AppError;
use herald_common::types::{User, UserNotificationStatus, UserRole, UserStatus};

pub(crate) const USER_COLUMNS: &str = "id, telegram_id, role, notification_status, user_group, firstname, surname, patronymic, mobile_phone, status";

/// Service layer for user CRUD operations.
pub struct UserService;

/// Parameters for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserParams {
    #[serde(default)]
    pub telegram_id: i64,
    pub role: Option<UserRole>,
    #[serde(default = "default_notification_status")]
    pub notification_status: UserNotificationStatus,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub surname: String,
    pub patronymic: Option<String>,
    #[serde(default)]
    pub mobile_phone: String,
}

fn default_notification_status() -> UserNotificationStatus {
    UserNotificationStatus::Enabled
}

impl CreateUserParams {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.telegram_id <= 0 {
            return Err(AppError::Validation(
                "telegram_id must be specified".to_string(),
            ));
        }
        if self.role.is_none() {
            return Err(AppError::Validation("role must be specified".to_string()));
        }
        if self.group.is_empty() {
            return Err(AppError::Validation("group must be specified".to_string()));
        }
        if self.mobile_phone.is_empty() {
            return Err(AppError::Validation(
                "mobile_phone must be specified".to_string(),
            ));
        }
        if self.firstname.is_empty() {
            return Err(AppError::Validation(
                "firstname must be specified".to_string(),
            ));
        }
        if self.surname.is_empty() {
            return Err(AppError::Validation("surname must be specified".to_string()));
        }
        Ok(())
    }
}

/// Partial update of a user. Absent fields keep their stored value.
///
/// An empty `patronymic` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserParams {
    pub telegram_id: Option<i64>,
    pub role: Option<UserRole>,
    pub notification_status: Option<UserNotificationStatus>,
    pub group: Option<String>,
    pub firstname: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub mobile_phone: Option<String>,
    pub status: Option<UserStatus>,
}

impl UpdateUserParams {
    pub fn validate(&self) -> Result<(), AppError> {
        if matches!(self.telegram_id, Some(id) if id <= 0) {
            return Err(AppError::Validation(
                "telegram_id must be positive".to_string(),
            ));
        }

        let required = [
            ("group", &self.group),
            ("firstname", &self.firstname),
            ("surname", &self.surname),
            ("mobile_phone", &self.mobile_phone),
        ];
        for (field, value) in required {
            if matches!(value.as_deref(), Some("")) {
                return Err(AppError::Validation(format!("{} must not be empty", field)));
            }
        }

        let untouched = self.telegram_id.is_none()
            && self.role.is_none()
            && self.notification_status.is_none()
            && self.patronymic.is_none()
            && self.status.is_none()
            && required.iter().all(|(_, value)| value.is_none());
        if untouched {
            return Err(AppError::Validation(
                "at least one field must be specified".to_string(),
            ));
        }
        Ok(())
    }
}

/// Equality filters for listing users; unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub telegram_id: Option<i64>,
    pub role: Option<UserRole>,
    pub notification_status: Option<UserNotificationStatus>,
    pub group: Option<String>,
    pub firstname: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub mobile_phone: Option<String>,
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// A page of users with the paging parameters echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub limit: i64,
    pub offset: i64,
    pub count: usize,
}

impl UserPage {
    fn new(users: Vec<User>, limit: i64, offset: i64) -> Self {
        Self {
            count: users.len(),
            users,
            limit,
            offset,
        }
    }
}

fn validate_paging(limit: i64, offset: i64) -> Result<(), AppError> {
    if limit <= 0 {
        return Err(AppError::Validation("limit must be specified".to_string()));
    }
    if offset < 0 {
        return Err(AppError::Validation(
            "offset must not be negative".to_string(),
        ));
    }
    Ok(())
}

impl UserService {
    /// Create a new user in status `ACTIVE`.
    pub async fn create(pool: &PgPool, params: &CreateUserParams) -> Result<User, AppError> {
        params.validate()?;
        let role = params
            .role
            .ok_or_else(|| AppError::Validation("role must be specified".to_string()))?;

        let user: User = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (telegram_id, role, notification_status, user_group, firstname, surname, patronymic, mobile_phone, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(params.telegram_id)
        .bind(role.to_string())
        .bind(params.notification_status.to_string())
        .bind(&params.group)
        .bind(&params.firstname)
        .bind(&params.surname)
        .bind(&params.patronymic)
        .bind(&params.mobile_phone)
        .bind(UserStatus::Active.to_string())
        .fetch_one(pool)
        .await?;

        tracing::info!(
            user_id = user.id,
            telegram_id = user.telegram_id,
            role = %user.role,
            "User created"
        );

        Ok(user)
    }

    /// Get a single user by id.
    pub async fn get(pool: &PgPool, user_id: i64) -> Result<User, AppError> {
        if user_id <= 0 {
            return Err(AppError::Validation("user_id must be specified".to_string()));
        }

        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Get a single user by Telegram id.
    pub async fn get_by_telegram_id(pool: &PgPool, telegram_id: i64) -> Result<User, AppError> {
        if telegram_id <= 0 {
            return Err(AppError::Validation(
                "telegram_id must be specified".to_string(),
            ));
        }

        sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1"
        ))
        .bind(telegram_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("User with telegram_id {} not found", telegram_id))
        })
    }

    /// List users whose id is in `user_ids`.
    pub async fn list_by_ids(
        pool: &PgPool,
        user_ids: &[i64],
        limit: i64,
        offset: i64,
    ) -> Result<UserPage, AppError> {
        if user_ids.is_empty() {
            return Err(AppError::Validation("user_ids must be specified".to_string()));
        }
        validate_paging(limit, offset)?;

        let users: Vec<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(user_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(UserPage::new(users, limit, offset))
    }

    /// List users matching every set field of `filter`.
    pub async fn list_by_filter(pool: &PgPool, filter: &UserFilter) -> Result<UserPage, AppError> {
        validate_paging(filter.limit, filter.offset)?;

        let users: Vec<User> = sqlx::query_as(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::BIGINT IS NULL OR telegram_id = $1)
              AND ($2::TEXT IS NULL OR role = $2)
              AND ($3::TEXT IS NULL OR notification_status = $3)
              AND ($4::TEXT IS NULL OR user_group = $4)
              AND ($5::TEXT IS NULL OR firstname = $5)
              AND ($6::TEXT IS NULL OR surname = $6)
              AND ($7::TEXT IS NULL OR patronymic = $7)
              AND ($8::TEXT IS NULL OR mobile_phone = $8)
              AND ($9::TEXT IS NULL OR status = $9)
            ORDER BY id
            LIMIT $10 OFFSET $11
            "#
        ))
        .bind(filter.telegram_id)
        .bind(filter.role.map(|r| r.to_string()))
        .bind(filter.notification_status.map(|s| s.to_string()))
        .bind(&filter.group)
        .bind(&filter.firstname)
        .bind(&filter.surname)
        .bind(&filter.patronymic)
        .bind(&filter.mobile_phone)
        .bind(filter.status.map(|s| s.to_string()))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

        Ok(UserPage::new(users, filter.limit, filter.offset))
    }

    /// Apply a partial update and return the stored user.
    pub async fn update(
        pool: &PgPool,
        user_id: i64,
        params: &UpdateUserParams,
    ) -> Result<User, AppError> {
        params.validate()?;
        let existing = Self::get(pool, user_id).await?;

        let telegram_id = params.telegram_id.unwrap_or(existing.telegram_id);
        let role = params.role.unwrap_or(existing.role);
        let notification_status = params
            .notification_status
            .unwrap_or(existing.notification_status);
        let group = params.group.clone().unwrap_or(existing.user_group);
        let firstname = params.firstname.clone().unwrap_or(existing.firstname);
        let surname = params.surname.clone().unwrap_or(existing.surname);
        let patronymic = match params.patronymic.as_deref() {
            None => existing.patronymic,
            Some("") => None,
            Some(p) => Some(p.to_string()),
        };
        let mobile_phone = params.mobile_phone.clone().unwrap_or(existing.mobile_phone);
        let status = params.status.unwrap_or(existing.status);

        let user: User = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET telegram_id = $1, role = $2, notification_status = $3, user_group = $4,
                firstname = $5, surname = $6, patronymic = $7, mobile_phone = $8, status = $9
            WHERE id = $10
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(telegram_id)
        .bind(role.to_string())
        .bind(notification_status.to_string())
        .bind(&group)
        .bind(&firstname)
        .bind(&surname)
        .bind(&patronymic)
        .bind(&mobile_phone)
        .bind(status.to_string())
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        tracing::info!(
            user_id,
            notification_status = %user.notification_status,
            status = %user.status,
            "User updated"
        );

        Ok(user)
    }

    /// Delete a user. Returns `NotFound` if no such user exists.
    pub async fn delete(pool: &PgPool, user_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        tracing::info!(user_id, "User deleted");
        Ok(())
    }
}
