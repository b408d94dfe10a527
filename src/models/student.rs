//! Student model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Graduated,
}

text_enum!(StudentStatus {
    Active => "active",
    Graduated => "graduated",
});

/// Student row from database. The id is assigned by the school roster.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class: String,
    pub status: StudentStatus,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A book currently held by a student
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowedBook {
    pub lending_id: i32,
    pub barcode: String,
    pub title: String,
    pub cover_url: Option<String>,
    pub due_date: NaiveDate,
    pub is_overdue: bool,
}

/// Student with the books currently on loan
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentDetails {
    #[serde(flatten)]
    pub student: Student,
    pub borrowed_books: Vec<BorrowedBook>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StudentQuery {
    /// Matches name or id
    pub q: Option<String>,
    pub class: Option<String>,
    pub status: Option<StudentStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudent {
    #[validate(length(min = 1, max = 32, message = "Student id must be 1-32 characters"))]
    pub id: String,
    #[validate(length(min = 1, max = 150, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "Class is required"))]
    pub class: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStudent {
    #[validate(length(min = 1, max = 150, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "Class is required"))]
    pub class: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePhoto {
    pub photo_url: Option<String>,
}
