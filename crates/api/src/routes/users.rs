//! User management routes.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use herald_common::error::AppError;
use herald_common::types::User;
use herald_engine::user::{CreateUserParams, UpdateUserParams, UserFilter, UserPage, UserService};

use super::parse_id_list;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user).get(list_users))
        .route("/api/users/search", get(search_users))
        .route(
            "/api/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/api/users/telegram/{telegram_id}", get(get_user_by_telegram_id))
}

/// Query string for listing by id; `ids` is a comma-separated list.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub ids: String,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// POST /api/users: Register a notification receiver.
async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserParams>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(params) = payload?;
    let user = UserService::create(&state.pool, &params).await?;
    Ok(Json(user))
}

/// GET /api/users?ids=1,2&limit=10&offset=0
async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<UserPage>, AppError> {
    let Query(query) = query?;
    let ids = parse_id_list(&query.ids, "user")?;
    let page = UserService::list_by_ids(&state.pool, &ids, query.limit, query.offset).await?;
    Ok(Json(page))
}

/// GET /api/users/search?role=STUDENT&group=CS-21&limit=10: Equality filters on any user field.
async fn search_users(
    State(state): State<AppState>,
    filter: Result<Query<UserFilter>, QueryRejection>,
) -> Result<Json<UserPage>, AppError> {
    let Query(filter) = filter?;
    let page = UserService::list_by_filter(&state.pool, &filter).await?;
    Ok(Json(page))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    let user = UserService::get(&state.pool, id).await?;
    Ok(Json(user))
}

/// PATCH /api/users/{id}: Change any subset of a user's fields.
async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserParams>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    let Json(params) = payload?;
    let user = UserService::update(&state.pool, id, &params).await?;
    Ok(Json(user))
}

/// GET /api/users/telegram/{telegram_id}
async fn get_user_by_telegram_id(
    State(state): State<AppState>,
    telegram_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(telegram_id) = telegram_id?;
    let user = UserService::get_by_telegram_id(&state.pool, telegram_id).await?;
    Ok(Json(user))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = id?;
    UserService::delete(&state.pool, id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
