//! Lendings repository for database operations

use std::pin::Pin;

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use tokio_stream::{Stream, StreamExt};

use super::abort;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        lending::{
            ActiveLending, ExtendResult, Lending, LendingFilter, LendingImportResult,
            LendingImportRow, OverdueLending, QuickReturnReceipt,
        },
        student::{BorrowedBook, StudentStatus},
    },
};

/// Lazily fetched rows, borrowed from the pool
pub type RowStream<'a, T> = Pin<Box<dyn Stream<Item = AppResult<T>> + Send + 'a>>;

const ACTIVE_LENDINGS_QUERY: &str = r#"
    SELECT l.id AS lending_id, l.due_date, b.barcode, b.title, b.signature, b.category_id,
           s.id AS student_id, s.name AS student_name, s.class AS student_class,
           (l.due_date < $3::date) AS is_overdue
    FROM lendings l
    JOIN books b ON l.book_barcode = b.barcode
    JOIN students s ON l.student_id = s.id
    WHERE l.status = 'active'
      AND ($1::text IS NULL OR b.signature = $1)
      AND ($2::int IS NULL OR b.category_id = $2)
    ORDER BY l.due_date ASC, l.id ASC
"#;

#[derive(Clone)]
pub struct LendingsRepository {
    pool: Pool<Postgres>,
}

impl LendingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get lending by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Lending> {
        sqlx::query_as::<_, Lending>("SELECT * FROM lendings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lending {} not found", id)))
    }

    /// The active lending of a copy, if any
    pub async fn find_active_by_barcode(&self, barcode: &str) -> AppResult<Option<Lending>> {
        let lending = sqlx::query_as::<_, Lending>(
            "SELECT * FROM lendings WHERE book_barcode = $1 AND status = 'active'",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lending)
    }

    /// Lend a copy to a student.
    ///
    /// Book and student rows are locked for the duration of the transaction so
    /// two desks cannot lend the same copy concurrently.
    pub async fn borrow(
        &self,
        student_id: &str,
        barcode: &str,
        due_date: NaiveDate,
        notes: Option<&str>,
    ) -> AppResult<Lending> {
        let mut tx = self.pool.begin().await?;

        let book_status: Option<BookStatus> =
            sqlx::query_scalar("SELECT status FROM books WHERE barcode = $1 FOR UPDATE")
                .bind(barcode)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(book_status) = book_status else {
            return abort(tx, AppError::NotFound(format!("Book {} not found", barcode))).await;
        };

        let student_status: Option<StudentStatus> =
            sqlx::query_scalar("SELECT status FROM students WHERE id = $1 FOR SHARE")
                .bind(student_id)
                .fetch_optional(&mut *tx)
                .await?;
        match student_status {
            None => {
                return abort(
                    tx,
                    AppError::NotFound(format!("Student {} not found", student_id)),
                )
                .await
            }
            Some(StudentStatus::Graduated) => {
                return abort(
                    tx,
                    AppError::Conflict(format!("Student {} is no longer active", student_id)),
                )
                .await
            }
            Some(StudentStatus::Active) => {}
        }

        let duplicate: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lendings
                WHERE student_id = $1 AND book_barcode = $2 AND status = 'active'
            )
            "#,
        )
        .bind(student_id)
        .bind(barcode)
        .fetch_one(&mut *tx)
        .await?;
        if duplicate {
            return abort(
                tx,
                AppError::DuplicateLoan(format!(
                    "Student {} already has book {} on loan",
                    student_id, barcode
                )),
            )
            .await;
        }

        if book_status != BookStatus::Available {
            return abort(
                tx,
                AppError::Conflict(format!("Book {} is not available", barcode)),
            )
            .await;
        }

        let lending = sqlx::query_as::<_, Lending>(
            r#"
            INSERT INTO lendings (student_id, book_barcode, due_date, status, notes)
            VALUES ($1, $2, $3, 'active', $4)
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(barcode)
        .bind(due_date)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET status = 'lent' WHERE barcode = $1")
            .bind(barcode)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(lending)
    }

    /// Return an active lending by id. A note is appended to the existing ones.
    pub async fn return_lending(
        &self,
        lending_id: i32,
        returned_by: i32,
        notes: Option<&str>,
    ) -> AppResult<Lending> {
        let mut tx = self.pool.begin().await?;

        let lending = sqlx::query_as::<_, Lending>(
            "SELECT * FROM lendings WHERE id = $1 AND status = 'active' FOR UPDATE",
        )
        .bind(lending_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(lending) = lending else {
            return abort(
                tx,
                AppError::NotFound(format!(
                    "Lending {} not found or already returned",
                    lending_id
                )),
            )
            .await;
        };

        let returned = sqlx::query_as::<_, Lending>(
            r#"
            UPDATE lendings
            SET status = 'returned',
                return_date = NOW(),
                returned_by = $2,
                notes = CASE
                    WHEN $3::text IS NULL THEN notes
                    ELSE CONCAT_WS(E'\n', notes, 'Returned: ' || $3)
                END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lending.id)
        .bind(returned_by)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET status = 'available' WHERE barcode = $1")
            .bind(&lending.book_barcode)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(returned)
    }

    /// Return whatever active lending holds the scanned copy
    pub async fn quick_return(
        &self,
        barcode: &str,
        returned_by: i32,
        returned_by_name: &str,
    ) -> AppResult<QuickReturnReceipt> {
        let mut tx = self.pool.begin().await?;

        let lending = sqlx::query_as::<_, Lending>(
            "SELECT * FROM lendings WHERE book_barcode = $1 AND status = 'active' FOR UPDATE",
        )
        .bind(barcode)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(lending) = lending else {
            return abort(
                tx,
                AppError::NotFound(format!("Book {} is not currently on loan", barcode)),
            )
            .await;
        };

        let returned = sqlx::query_as::<_, Lending>(
            r#"
            UPDATE lendings
            SET status = 'returned', return_date = NOW(), returned_by = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lending.id)
        .bind(returned_by)
        .fetch_one(&mut *tx)
        .await?;

        let book_title: String = sqlx::query_scalar(
            "UPDATE books SET status = 'available' WHERE barcode = $1 RETURNING title",
        )
        .bind(barcode)
        .fetch_one(&mut *tx)
        .await?;

        let student_name: String = sqlx::query_scalar("SELECT name FROM students WHERE id = $1")
            .bind(&lending.student_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(QuickReturnReceipt {
            lending_id: returned.id,
            book_barcode: returned.book_barcode,
            book_title,
            student_id: returned.student_id,
            student_name,
            // Set by the UPDATE above
            returned_at: returned.return_date.unwrap_or(returned.lent_at),
            returned_by_name: returned_by_name.to_string(),
        })
    }

    /// Reverse a quick return: the lending becomes active again and the copy lent.
    ///
    /// A compensating action; availability is not re-checked. If the copy was
    /// lent to someone else in the meantime the unique active-lending index
    /// rejects it.
    pub async fn undo_return(&self, lending_id: i32) -> AppResult<Lending> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> =
            sqlx::query_scalar("SELECT book_barcode FROM lendings WHERE id = $1 FOR UPDATE")
                .bind(lending_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(barcode) = exists else {
            return abort(
                tx,
                AppError::NotFound(format!("Lending {} not found", lending_id)),
            )
            .await;
        };

        let restored = sqlx::query_as::<_, Lending>(
            r#"
            UPDATE lendings
            SET status = 'active', return_date = NULL, returned_by = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lending_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Integrity(_) => AppError::Conflict(format!(
                "Book {} has been lent again since it was returned",
                barcode
            )),
            other => other,
        })?;

        sqlx::query("UPDATE books SET status = 'lent' WHERE barcode = $1")
            .bind(&barcode)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(restored)
    }

    /// Set the due date of active lendings. Ids that are unknown or already
    /// returned are skipped.
    pub async fn extend(
        &self,
        lending_ids: &[i32],
        new_due_date: NaiveDate,
    ) -> AppResult<ExtendResult> {
        let result = sqlx::query_as::<_, ExtendResult>(
            r#"
            WITH extended AS (
                UPDATE lendings
                SET due_date = $1
                WHERE id = ANY($2) AND status = 'active'
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM extended) AS extended,
                   $1::date AS new_due_date
            "#,
        )
        .bind(new_due_date)
        .bind(lending_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(result)
    }

    /// Active lendings narrowed by shelf signature and/or category.
    ///
    /// Rows are pulled from the store as the stream is polled; every call
    /// starts a fresh query.
    pub fn active<'a>(
        &'a self,
        filter: &LendingFilter,
        today: NaiveDate,
    ) -> RowStream<'a, ActiveLending> {
        let stream = sqlx::query_as::<_, ActiveLending>(ACTIVE_LENDINGS_QUERY)
            .bind(filter.signature.clone())
            .bind(filter.category_id)
            .bind(today)
            .fetch(&self.pool)
            .map(|row| row.map_err(AppError::from));
        Box::pin(stream)
    }

    /// Active lendings past their due date, oldest due date first
    pub async fn overdue(&self, today: NaiveDate) -> AppResult<Vec<OverdueLending>> {
        let rows = sqlx::query_as::<_, OverdueLending>(
            r#"
            SELECT l.id AS lending_id, l.due_date, ($1::date - l.due_date) AS days_overdue,
                   b.barcode, b.title, b.cover_url,
                   s.id AS student_id, s.name AS student_name, s.class AS student_class
            FROM lendings l
            JOIN books b ON l.book_barcode = b.barcode
            JOIN students s ON l.student_id = s.id
            WHERE l.status = 'active' AND l.due_date < $1
            ORDER BY l.due_date ASC, l.id ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Books a student currently holds
    pub async fn student_lendings(
        &self,
        student_id: &str,
        today: NaiveDate,
    ) -> AppResult<Vec<BorrowedBook>> {
        let rows = sqlx::query_as::<_, BorrowedBook>(
            r#"
            SELECT l.id AS lending_id, b.barcode, b.title, b.cover_url, l.due_date,
                   (l.due_date < $2::date) AS is_overdue
            FROM lendings l
            JOIN books b ON l.book_barcode = b.barcode
            WHERE l.student_id = $1 AND l.status = 'active'
            ORDER BY l.due_date ASC
            "#,
        )
        .bind(student_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Import existing lendings in one transaction. Every row must name a
    /// known student and an available copy; the first bad row aborts the
    /// whole import.
    pub async fn import(&self, rows: &[LendingImportRow]) -> AppResult<LendingImportResult> {
        let mut tx = self.pool.begin().await?;
        let mut result = LendingImportResult::default();

        for row in rows {
            let book_status: Option<BookStatus> =
                sqlx::query_scalar("SELECT status FROM books WHERE barcode = $1 FOR UPDATE")
                    .bind(&row.book_barcode)
                    .fetch_optional(&mut *tx)
                    .await?;
            match book_status {
                None => {
                    return abort(
                        tx,
                        AppError::Validation(format!(
                            "Row {}: book {} not found",
                            row.row, row.book_barcode
                        )),
                    )
                    .await
                }
                Some(BookStatus::Lent) => {
                    return abort(
                        tx,
                        AppError::Conflict(format!(
                            "Row {}: book {} is already on loan",
                            row.row, row.book_barcode
                        )),
                    )
                    .await
                }
                Some(BookStatus::Available) => {}
            }

            let student_known: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
                    .bind(&row.student_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !student_known {
                return abort(
                    tx,
                    AppError::Validation(format!(
                        "Row {}: student {} not found",
                        row.row, row.student_id
                    )),
                )
                .await;
            }

            sqlx::query(
                r#"
                INSERT INTO lendings (student_id, book_barcode, due_date, status)
                VALUES ($1, $2, $3, 'active')
                "#,
            )
            .bind(&row.student_id)
            .bind(&row.book_barcode)
            .bind(row.due_date)
            .execute(&mut *tx)
            .await?;
            result.created += 1;

            let marked = sqlx::query("UPDATE books SET status = 'lent' WHERE barcode = $1")
                .bind(&row.book_barcode)
                .execute(&mut *tx)
                .await?;
            result.books_marked_lent += marked.rows_affected();
        }

        tx.commit().await?;
        Ok(result)
    }
}
