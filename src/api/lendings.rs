//! Lending endpoints: borrow, return, extend, quick return and listings

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio_stream::StreamExt;
use validator::Validate;

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::{
        lending::{
            ActiveLending, CreateLending, ExtendLendings, ExtendResult, Lending, LendingFilter,
            LendingImportResult, OverdueLending, QuickReturnReceipt, QuickReturnRequest,
            ReturnLending, UndoReturnRequest,
        },
        workbook::Workbook,
    },
    AppState,
};

/// Lend a book to a student
#[utoipa::path(
    post,
    path = "/lendings",
    tag = "lendings",
    security(("bearer_auth" = [])),
    request_body = CreateLending,
    responses(
        (status = 201, description = "Book lent", body = Lending),
        (status = 404, description = "Book or student not found"),
        (status = 409, description = "Book not available, duplicate loan or graduated student")
    )
)]
pub async fn create_lending(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<CreateLending>,
) -> AppResult<(StatusCode, Json<ApiResponse<Lending>>)> {
    identity.require_staff()?;
    let lending = state.services.lending.borrow(&request).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(lending, "Book lent"),
    ))
}

/// Return a lending
#[utoipa::path(
    post,
    path = "/lendings/{id}/return",
    tag = "lendings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Lending ID")),
    request_body = ReturnLending,
    responses(
        (status = 200, description = "Book returned", body = Lending),
        (status = 404, description = "No active lending with this id")
    )
)]
pub async fn return_lending(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
    request: Option<Json<ReturnLending>>,
) -> ApiResult<Lending> {
    identity.require_staff()?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let lending = state
        .services
        .lending
        .return_lending(&identity, id, &request)
        .await?;
    Ok(ApiResponse::with_message(lending, "Book returned"))
}

/// Active lendings, optionally filtered by signature or category
#[utoipa::path(
    post,
    path = "/lendings/filter",
    tag = "lendings",
    security(("bearer_auth" = [])),
    request_body = LendingFilter,
    responses(
        (status = 200, description = "Active lendings", body = Vec<ActiveLending>)
    )
)]
pub async fn filter_lendings(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(filter): Json<LendingFilter>,
) -> ApiResult<Vec<ActiveLending>> {
    identity.require_staff()?;
    let rows: AppResult<Vec<ActiveLending>> =
        state.services.lending.active(&filter).collect().await;
    Ok(ApiResponse::ok(rows?))
}

/// Overdue report, most overdue first
#[utoipa::path(
    get,
    path = "/lendings/overdue",
    tag = "lendings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue lendings", body = Vec<OverdueLending>)
    )
)]
pub async fn overdue_lendings(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> ApiResult<Vec<OverdueLending>> {
    identity.require_staff()?;
    let overdue = state.services.lending.overdue().await?;
    Ok(ApiResponse::ok(overdue))
}

/// Reset the due date of several lendings
#[utoipa::path(
    post,
    path = "/lendings/extend",
    tag = "lendings",
    security(("bearer_auth" = [])),
    request_body = ExtendLendings,
    responses(
        (status = 200, description = "Lendings extended", body = ExtendResult),
        (status = 400, description = "Invalid number of days")
    )
)]
pub async fn extend_lendings(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<ExtendLendings>,
) -> ApiResult<ExtendResult> {
    identity.require_staff()?;
    let result = state.services.lending.extend(&request).await?;
    Ok(ApiResponse::with_message(
        result,
        format!("{} lending(s) extended", result.extended),
    ))
}

/// Return the lending holding the scanned copy
#[utoipa::path(
    post,
    path = "/lendings/quick-return",
    tag = "lendings",
    security(("bearer_auth" = [])),
    request_body = QuickReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = QuickReturnReceipt),
        (status = 404, description = "No active lending for this barcode")
    )
)]
pub async fn quick_return(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<QuickReturnRequest>,
) -> ApiResult<QuickReturnReceipt> {
    identity.require_staff()?;
    request.validate()?;
    let receipt = state
        .services
        .quick_return
        .quick_return(&identity, &request.barcode)
        .await?;
    Ok(ApiResponse::with_message(receipt, "Book returned"))
}

/// Undo a quick return
#[utoipa::path(
    post,
    path = "/lendings/undo-return",
    tag = "lendings",
    security(("bearer_auth" = [])),
    request_body = UndoReturnRequest,
    responses(
        (status = 200, description = "Lending active again", body = Lending),
        (status = 404, description = "Lending not found"),
        (status = 409, description = "The copy was lent again since the return")
    )
)]
pub async fn undo_return(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<UndoReturnRequest>,
) -> ApiResult<Lending> {
    identity.require_staff()?;
    let lending = state
        .services
        .quick_return
        .undo(&identity, request.lending_id)
        .await?;
    Ok(ApiResponse::with_message(lending, "Return undone"))
}

/// Import existing lendings from the `Ausleihen` sheet
#[utoipa::path(
    post,
    path = "/lendings/import",
    tag = "lendings",
    security(("bearer_auth" = [])),
    request_body = Workbook,
    responses(
        (status = 200, description = "Lendings imported", body = LendingImportResult),
        (status = 400, description = "Missing sheet, column or referenced record"),
        (status = 409, description = "A listed book is already on loan")
    )
)]
pub async fn import_lendings(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(workbook): Json<Workbook>,
) -> ApiResult<LendingImportResult> {
    identity.require_staff()?;
    let result = state.services.lending.import(&workbook).await?;
    Ok(ApiResponse::with_message(
        result,
        format!("{} lending(s) imported", result.created),
    ))
}
