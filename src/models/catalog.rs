//! Reference data: categories and suppliers, and the universal search hit

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    book::Book,
    student::{Student, StudentDetails},
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Category with derived book counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryWithCounts {
    pub id: i32,
    pub name: String,
    pub total_books: i64,
    pub available_books: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100, message = "Category name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Supplier with copies ordered from it and copies already delivered
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SupplierWithCounts {
    pub id: i32,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub ordered_copies: i64,
    pub received_copies: i64,
}

/// Create/update supplier request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 150, message = "Supplier name is required"))]
    pub name: String,
    pub contact_person: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// What a single search term resolved to. A lent copy resolves to its borrower.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SearchHit {
    StudentDetails(StudentDetails),
    BookDetails(Book),
    StudentList(Vec<Student>),
}
