//! Authentication endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    models::user::{Identity, User},
    AppState,
};

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response with the bearer token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub user: User,
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (token, user) = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;

    Ok(ApiResponse::with_message(
        LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            user,
        },
        "Login successful",
    ))
}

/// Identity of the current token
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current identity", body = Identity),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(identity): AuthenticatedUser) -> ApiResult<Identity> {
    Ok(ApiResponse::ok(identity))
}
