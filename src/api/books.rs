//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::book::{BatchDeleteBooks, Book, BookQuery, CreateBook, UpdateBook, UpdateCover},
    models::Page,
    AppState,
};

#[derive(Serialize, ToSchema)]
pub struct DeletedBooks {
    pub deleted: u64,
}

/// Search books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books, with the borrower of lent copies", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> ApiResult<Page<Book>> {
    identity.require_staff()?;
    let page = state.services.catalog.search_books(&query).await?;
    Ok(ApiResponse::ok(page))
}

/// Get a book by barcode
#[utoipa::path(
    get,
    path = "/books/{barcode}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("barcode" = String, Path, description = "Library barcode")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(barcode): Path<String>,
) -> ApiResult<Book> {
    identity.require_staff()?;
    let book = state.services.catalog.get_book(&barcode).await?;
    Ok(ApiResponse::ok(book))
}

/// Copies of an ISBN in the local catalog
#[utoipa::path(
    get,
    path = "/books/isbn/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "ISBN, hyphens optional")),
    responses(
        (status = 200, description = "Matching copies (possibly none)", body = Vec<Book>)
    )
)]
pub async fn books_by_isbn(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> ApiResult<Vec<Book>> {
    identity.require_staff()?;
    let books = state.services.catalog.books_by_isbn(&isbn).await?;
    Ok(ApiResponse::ok(books))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Barcode already exists")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<ApiResponse<Book>>)> {
    identity.require_staff()?;
    let created = state.services.catalog.create_book(&book).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "Book created"),
    ))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{barcode}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("barcode" = String, Path, description = "Library barcode")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(barcode): Path<String>,
    Json(book): Json<UpdateBook>,
) -> ApiResult<Book> {
    identity.require_staff()?;
    let updated = state.services.catalog.update_book(&barcode, &book).await?;
    Ok(ApiResponse::with_message(updated, "Book updated"))
}

/// Set or clear the cover reference
#[utoipa::path(
    put,
    path = "/books/{barcode}/cover",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("barcode" = String, Path, description = "Library barcode")),
    request_body = UpdateCover,
    responses(
        (status = 200, description = "Cover updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn set_cover(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(barcode): Path<String>,
    Json(cover): Json<UpdateCover>,
) -> ApiResult<Book> {
    identity.require_staff()?;
    let book = state
        .services
        .catalog
        .set_cover(&barcode, cover.cover_url.as_deref())
        .await?;
    Ok(ApiResponse::with_message(book, "Cover updated"))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{barcode}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("barcode" = String, Path, description = "Library barcode")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is on loan")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(barcode): Path<String>,
) -> ApiResult<()> {
    identity.require_staff()?;
    state.services.catalog.delete_book(&barcode).await?;
    Ok(ApiResponse::with_message((), "Book deleted"))
}

/// Delete several books at once
#[utoipa::path(
    delete,
    path = "/books/batch",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BatchDeleteBooks,
    responses(
        (status = 200, description = "Books deleted", body = DeletedBooks),
        (status = 409, description = "At least one book is on loan; nothing deleted")
    )
)]
pub async fn delete_books(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<BatchDeleteBooks>,
) -> ApiResult<DeletedBooks> {
    identity.require_staff()?;
    let deleted = state.services.catalog.delete_books(&request.barcodes).await?;
    Ok(ApiResponse::with_message(
        DeletedBooks { deleted },
        format!("{} book(s) deleted", deleted),
    ))
}
