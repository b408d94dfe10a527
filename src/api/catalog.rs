//! Category and supplier endpoints, and the universal search box

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::catalog::{
        Category, CategoryWithCounts, CreateCategory, SearchHit, Supplier, SupplierInput,
        SupplierWithCounts,
    },
    AppState,
};

/// List categories with book counters
#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories", body = Vec<CategoryWithCounts>)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> ApiResult<Vec<CategoryWithCounts>> {
    identity.require_staff()?;
    let categories = state.services.catalog.list_categories().await?;
    Ok(ApiResponse::ok(categories))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 409, description = "Name already exists")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(category): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    identity.require_staff()?;
    let created = state.services.catalog.create_category(&category).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "Category created"),
    ))
}

/// Delete a category; its books become uncategorized
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    identity.require_staff()?;
    state.services.catalog.delete_category(id).await?;
    Ok(ApiResponse::with_message((), "Category deleted"))
}

/// List suppliers with ordered and delivered copy counts
#[utoipa::path(
    get,
    path = "/suppliers",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Suppliers", body = Vec<SupplierWithCounts>)
    )
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> ApiResult<Vec<SupplierWithCounts>> {
    identity.require_staff()?;
    let suppliers = state.services.catalog.list_suppliers().await?;
    Ok(ApiResponse::ok(suppliers))
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/suppliers",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = SupplierInput,
    responses(
        (status = 201, description = "Supplier created", body = Supplier),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(supplier): Json<SupplierInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Supplier>>)> {
    identity.require_staff()?;
    let created = state.services.catalog.create_supplier(&supplier).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "Supplier created"),
    ))
}

/// Update a supplier
#[utoipa::path(
    put,
    path = "/suppliers/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supplier ID")),
    request_body = SupplierInput,
    responses(
        (status = 200, description = "Supplier updated", body = Supplier),
        (status = 404, description = "Supplier not found")
    )
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(supplier): Json<SupplierInput>,
) -> ApiResult<Supplier> {
    identity.require_staff()?;
    let updated = state.services.catalog.update_supplier(id, &supplier).await?;
    Ok(ApiResponse::with_message(updated, "Supplier updated"))
}

/// Delete a supplier without orders
#[utoipa::path(
    delete,
    path = "/suppliers/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier deleted"),
        (status = 404, description = "Supplier not found"),
        (status = 409, description = "Supplier has orders")
    )
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    identity.require_staff()?;
    state.services.catalog.delete_supplier(id).await?;
    Ok(ApiResponse::with_message((), "Supplier deleted"))
}

/// Resolve a scanned or typed term to a student, a book or a list of students
#[utoipa::path(
    get,
    path = "/universal-search/{term}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("term" = String, Path, description = "Student id, barcode or part of a name")),
    responses(
        (status = 200, description = "Search hit", body = SearchHit),
        (status = 404, description = "No student or book matches")
    )
)]
pub async fn universal_search(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(term): Path<String>,
) -> ApiResult<SearchHit> {
    identity.require_staff()?;
    let hit = state.services.catalog.universal_search(&term).await?;
    Ok(ApiResponse::ok(hit))
}
