//! Stock-taking endpoint

use axum::{extract::State, Json};

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    models::reconciliation::{InventoryReport, InventoryScan},
    AppState,
};

/// Compare scanned barcodes with the catalog
#[utoipa::path(
    post,
    path = "/inventory/check",
    tag = "inventory",
    security(("bearer_auth" = [])),
    request_body = InventoryScan,
    responses(
        (status = 200, description = "Scan classified into four disjoint groups", body = InventoryReport)
    )
)]
pub async fn inventory_check(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(scan): Json<InventoryScan>,
) -> ApiResult<InventoryReport> {
    identity.require_staff()?;
    let report = state
        .services
        .reconciliation
        .inventory_check(&scan.barcodes)
        .await?;
    Ok(ApiResponse::ok(report))
}
