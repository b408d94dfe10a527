//! Settings endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{models::settings::Setting, AppState};

/// Read a setting; unsaved keys with a built-in default return the default
#[utoipa::path(
    get,
    path = "/settings/{key}",
    tag = "settings",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting value", body = Setting),
        (status = 404, description = "Unknown key")
    )
)]
pub async fn get_setting(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(key): Path<String>,
) -> ApiResult<Setting> {
    identity.require_staff()?;
    let setting = state.services.settings.get(&key).await?;
    Ok(ApiResponse::ok(setting))
}

/// Store a setting, replacing any previous value
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = Setting,
    responses(
        (status = 200, description = "Setting saved", body = Setting),
        (status = 400, description = "Invalid key")
    )
)]
pub async fn put_setting(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(setting): Json<Setting>,
) -> ApiResult<Setting> {
    identity.require_staff()?;
    let saved = state.services.settings.put(&setting).await?;
    Ok(ApiResponse::with_message(saved, "Setting saved"))
}
