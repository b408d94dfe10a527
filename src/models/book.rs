//! Book (physical copy) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::text_enum;

/// Shelf status of a copy. `Lent` iff exactly one active lending references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Lent,
}

text_enum!(BookStatus {
    Available => "available",
    Lent => "lent",
});

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Library barcode, unique per physical copy
    pub barcode: String,
    pub isbn: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    /// Shelf signature
    pub signature: Option<String>,
    pub category_id: Option<i32>,
    pub status: BookStatus,
    pub cover_url: Option<String>,
    /// Set when the copy was materialized from an order delivery
    pub order_item_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    // Computed (populated when queried with the active lending join)
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower_name: Option<String>,
}

/// Book search parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Matches title, author or barcode
    pub q: Option<String>,
    pub category_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 64, message = "Barcode must be 1-64 characters"))]
    pub barcode: String,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub signature: Option<String>,
    pub category_id: Option<i32>,
}

/// Update book request (absent fields are left unchanged)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub signature: Option<String>,
    pub category_id: Option<i32>,
}

/// Cover reference update
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateCover {
    pub cover_url: Option<String>,
}

/// Batch delete request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BatchDeleteBooks {
    pub barcodes: Vec<String>,
}
