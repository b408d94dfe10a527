//! Lending (loan) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LendingStatus {
    Active,
    Returned,
}

text_enum!(LendingStatus {
    Active => "active",
    Returned => "returned",
});

/// Lending row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lending {
    pub id: i32,
    pub student_id: String,
    pub book_barcode: String,
    pub lent_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub status: LendingStatus,
    pub return_date: Option<DateTime<Utc>>,
    /// User who processed the return
    pub returned_by: Option<i32>,
    pub notes: Option<String>,
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLending {
    #[validate(length(min = 1, message = "Student id is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "Book barcode is required"))]
    pub book_barcode: String,
    /// Defaults to today plus the configured loan duration
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Return request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ReturnLending {
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct QuickReturnRequest {
    #[validate(length(min = 1, message = "Barcode is required"))]
    pub barcode: String,
}

/// Everything needed to show a returned book and offer an undo
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuickReturnReceipt {
    pub lending_id: i32,
    pub book_barcode: String,
    pub book_title: String,
    pub student_id: String,
    pub student_name: String,
    pub returned_at: DateTime<Utc>,
    pub returned_by_name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UndoReturnRequest {
    pub lending_id: i32,
}

/// Batch extension request. The new due date is today + `days`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ExtendLendings {
    pub lending_ids: Vec<i32>,
    pub days: i64,
}

#[derive(Debug, Clone, Copy, Serialize, FromRow, ToSchema)]
pub struct ExtendResult {
    pub extended: i64,
    pub new_due_date: NaiveDate,
}

/// Filters for the active lending listing
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LendingFilter {
    /// Exact shelf signature
    pub signature: Option<String>,
    pub category_id: Option<i32>,
}

/// Active lending joined with book and student display fields
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActiveLending {
    pub lending_id: i32,
    pub due_date: NaiveDate,
    pub barcode: String,
    pub title: String,
    pub signature: Option<String>,
    pub category_id: Option<i32>,
    pub student_id: String,
    pub student_name: String,
    pub student_class: String,
    pub is_overdue: bool,
}

/// Overdue report line
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OverdueLending {
    pub lending_id: i32,
    pub due_date: NaiveDate,
    pub days_overdue: i32,
    pub barcode: String,
    pub title: String,
    pub cover_url: Option<String>,
    pub student_id: String,
    pub student_name: String,
    pub student_class: String,
}

/// One row of the `Ausleihen` import sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingImportRow {
    /// Spreadsheet row number (the header is row 1)
    pub row: usize,
    pub student_id: String,
    pub book_barcode: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct LendingImportResult {
    pub created: u64,
    pub books_marked_lent: u64,
}
