//! Staff account management (administrators only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateUser, User},
    AppState,
};

/// List accounts
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Accounts", body = Vec<User>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> ApiResult<Vec<User>> {
    identity.require_admin()?;
    let users = state.services.users.list().await?;
    Ok(ApiResponse::ok(users))
}

/// Get an account
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<User> {
    identity.require_admin()?;
    let user = state.services.users.get(id).await?;
    Ok(ApiResponse::ok(user))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    identity.require_admin()?;
    let created = state.services.users.create(&user).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "User created"),
    ))
}

/// Update an account; a new password is hashed before storage
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Account updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(user): Json<UpdateUser>,
) -> ApiResult<User> {
    identity.require_admin()?;
    let updated = state.services.users.update(id, &user).await?;
    Ok(ApiResponse::with_message(updated, "User updated"))
}

/// Delete an account. The primary administrator and the caller's own
/// account cannot be deleted.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Account is protected")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    identity.require_admin()?;
    state.services.users.delete(&identity, id).await?;
    Ok(ApiResponse::with_message((), "User deleted"))
}
