//! Books repository for database operations

use sqlx::{Pool, Postgres};

use super::{
    abort,
    table::{Filter, Record, Table},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, BookStatus, CreateBook, UpdateBook},
        reconciliation::InventoryBook,
        Page, PageQuery,
    },
};

impl Record for Book {
    const LABEL: &'static str = "Book";
    const TABLE: &'static str = "books";
    const KEY: &'static str = "barcode";
    const COLUMNS: &'static str = "t.*, s.name AS borrower_name";
    const JOINS: &'static str = r#"
        LEFT JOIN lendings l ON l.book_barcode = t.barcode AND l.status = 'active'
        LEFT JOIN students s ON s.id = l.student_id
    "#;
    const SEARCH_COLUMNS: &'static [&'static str] = &["t.title", "t.author", "t.barcode"];
    const ORDER_BY: &'static str = "t.title ASC, t.barcode ASC";
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
    table: Table<Book>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            table: Table::new(pool.clone()),
            pool,
        }
    }

    /// Get book by barcode, with the current borrower when lent
    pub async fn get(&self, barcode: &str) -> AppResult<Book> {
        self.table.get(barcode).await
    }

    pub async fn find(&self, barcode: &str) -> AppResult<Option<Book>> {
        self.table.find(barcode).await
    }

    /// Search books by title, author or barcode
    pub async fn search(&self, query: &BookQuery) -> AppResult<Page<Book>> {
        let page = PageQuery {
            q: query.q.clone(),
            page: query.page,
            per_page: query.per_page,
        };
        let mut filters = Vec::new();
        if let Some(category_id) = query.category_id {
            filters.push(Filter::Int("t.category_id", category_id));
        }
        self.table.search(&page, &filters).await
    }

    /// Copies of an edition in the local catalog
    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT t.*, s.name AS borrower_name
            FROM books t
            LEFT JOIN lendings l ON l.book_barcode = t.barcode AND l.status = 'active'
            LEFT JOIN students s ON s.id = l.student_id
            WHERE REPLACE(t.isbn, '-', '') = REPLACE($1, '-', '')
            ORDER BY t.barcode
            "#,
        )
        .bind(isbn.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Create a new book. A duplicate barcode surfaces as an integrity error.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let barcode: String = sqlx::query_scalar(
            r#"
            INSERT INTO books (barcode, isbn, title, author, publisher, signature, category_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'available')
            RETURNING barcode
            "#,
        )
        .bind(book.barcode.trim())
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.signature)
        .bind(book.category_id)
        .fetch_one(&self.pool)
        .await?;

        self.get(&barcode).await
    }

    /// Update an existing book; absent fields keep their value
    pub async fn update(&self, barcode: &str, book: &UpdateBook) -> AppResult<Book> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                isbn = COALESCE($2, isbn),
                title = COALESCE($3, title),
                author = COALESCE($4, author),
                publisher = COALESCE($5, publisher),
                signature = COALESCE($6, signature),
                category_id = COALESCE($7, category_id)
            WHERE barcode = $1
            "#,
        )
        .bind(barcode)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.signature)
        .bind(book.category_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", barcode)));
        }
        self.get(barcode).await
    }

    pub async fn update_cover(&self, barcode: &str, cover_url: Option<&str>) -> AppResult<Book> {
        let result = sqlx::query("UPDATE books SET cover_url = $2 WHERE barcode = $1")
            .bind(barcode)
            .bind(cover_url)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", barcode)));
        }
        self.get(barcode).await
    }

    /// Delete a copy that is not on loan
    pub async fn delete(&self, barcode: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let status: Option<BookStatus> =
            sqlx::query_scalar("SELECT status FROM books WHERE barcode = $1 FOR UPDATE")
                .bind(barcode)
                .fetch_optional(&mut *tx)
                .await?;
        match status {
            None => {
                return abort(tx, AppError::NotFound(format!("Book {} not found", barcode))).await
            }
            Some(BookStatus::Lent) => {
                return abort(
                    tx,
                    AppError::Conflict(format!("Book {} is currently on loan", barcode)),
                )
                .await
            }
            Some(BookStatus::Available) => {}
        }

        sqlx::query("DELETE FROM books WHERE barcode = $1")
            .bind(barcode)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete several copies at once; nothing is deleted if any of them is on loan
    pub async fn delete_many(&self, barcodes: &[String]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let locked: Vec<(String, BookStatus)> = sqlx::query_as(
            r#"
            SELECT barcode, status FROM books
            WHERE barcode = ANY($1)
            ORDER BY barcode
            FOR UPDATE
            "#,
        )
        .bind(barcodes)
        .fetch_all(&mut *tx)
        .await?;
        let lent: Vec<String> = locked
            .into_iter()
            .filter(|(_, status)| *status == BookStatus::Lent)
            .map(|(barcode, _)| barcode)
            .collect();
        if !lent.is_empty() {
            return abort(
                tx,
                AppError::Conflict(format!("Books on loan: {}", lent.join(", "))),
            )
            .await;
        }

        let result = sqlx::query("DELETE FROM books WHERE barcode = ANY($1)")
            .bind(barcodes)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Every copy in the catalog, as seen by an inventory check
    pub async fn inventory_snapshot(&self) -> AppResult<Vec<InventoryBook>> {
        let books = sqlx::query_as::<_, InventoryBook>(
            "SELECT barcode, title, author, status FROM books ORDER BY barcode",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
