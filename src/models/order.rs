//! Supplier orders and pre-assigned library barcodes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Ordered,
    PartiallyReceived,
    Received,
}

text_enum!(OrderStatus {
    Ordered => "ordered",
    PartiallyReceived => "partially_received",
    Received => "received",
});

/// Order header row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i32,
    pub order_date: NaiveDate,
    pub supplier_id: Option<i32>,
    /// Capability for the read-only supplier view
    pub public_token: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order header with supplier name and copy counters, for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub order_date: NaiveDate,
    pub supplier_id: Option<i32>,
    pub supplier_name: Option<String>,
    pub status: OrderStatus,
    pub copies: i64,
    pub received: i64,
    pub created_at: DateTime<Utc>,
}

/// One ordered physical copy with its pre-assigned barcode
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub isbn: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub library_barcode_id: String,
    pub received_at: Option<DateTime<Utc>>,
}

/// Order line as submitted: one title, `quantity` copies
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderLine {
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrder {
    pub order_date: NaiveDate,
    pub supplier_id: Option<i32>,
    #[validate(length(min = 1, message = "An order needs at least one item"), nested)]
    pub items: Vec<OrderLine>,
}

/// Order item about to be inserted, barcode already allocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrderItem {
    pub isbn: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub library_barcode_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedOrder {
    pub order_id: i32,
    pub generated_ids: Vec<String>,
    pub public_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub supplier_name: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Item as shown through the public token link
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PublicOrderItem {
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub library_barcode_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicOrder {
    pub order_id: i32,
    pub order_date: NaiveDate,
    pub supplier_id: Option<i32>,
    pub items: Vec<PublicOrderItem>,
}

/// Optional shelving data applied when a delivered copy becomes a book
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReceiveDelivery {
    pub category_id: Option<i32>,
    pub signature: Option<String>,
}

/// Expand order lines into one item per physical copy, numbering barcodes
/// consecutively from `next_id`. Returns the items and the next free number.
pub fn allocate_barcodes(
    prefix: &str,
    next_id: i64,
    lines: &[OrderLine],
) -> (Vec<PendingOrderItem>, i64) {
    let mut counter = next_id;
    let mut items = Vec::with_capacity(lines.iter().map(|l| l.quantity as usize).sum());

    for line in lines {
        for _ in 0..line.quantity {
            items.push(PendingOrderItem {
                isbn: line.isbn.clone(),
                title: line.title.clone(),
                author: line.author.clone(),
                library_barcode_id: format!("{}{}", prefix, counter),
            });
            counter += 1;
        }
    }

    (items, counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(title: &str, quantity: u32) -> OrderLine {
        OrderLine {
            isbn: Some("X".into()),
            title: title.into(),
            author: None,
            quantity,
        }
    }

    #[test]
    fn test_allocate_consecutive_barcodes() {
        let (items, next) = allocate_barcodes("buch-", 10, &[line("Momo", 3)]);
        let ids: Vec<_> = items.iter().map(|i| i.library_barcode_id.as_str()).collect();
        assert_eq!(ids, vec!["buch-10", "buch-11", "buch-12"]);
        assert_eq!(next, 13);
    }

    #[test]
    fn test_allocate_across_lines() {
        let (items, next) =
            allocate_barcodes("buch-", 1, &[line("Momo", 2), line("Krabat", 1)]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].title, "Momo");
        assert_eq!(items[2].title, "Krabat");
        assert_eq!(items[2].library_barcode_id, "buch-3");
        assert_eq!(next, 4);
    }

    #[test]
    fn test_allocate_nothing_keeps_counter() {
        let (items, next) = allocate_barcodes("buch-", 42, &[]);
        assert!(items.is_empty());
        assert_eq!(next, 42);
    }

    #[test]
    fn test_order_needs_items() {
        let order = CreateOrder {
            order_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            supplier_id: None,
            items: vec![],
        };
        assert!(order.validate().is_err());

        let order = CreateOrder {
            items: vec![line("Momo", 0)],
            ..order
        };
        let errors = order.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));

        let order = CreateOrder {
            items: vec![line("Momo", 2)],
            ..order
        };
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_status_text() {
        assert_eq!(OrderStatus::PartiallyReceived.as_str(), "partially_received");
        assert_eq!(
            serde_json::to_value(OrderStatus::PartiallyReceived).unwrap(),
            "partially_received"
        );
    }
}
