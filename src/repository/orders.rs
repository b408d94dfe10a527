//! Orders repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::abort;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        order::{
            allocate_barcodes, CreatedOrder, Order, OrderDetails, OrderItem, OrderLine,
            OrderSummary, PublicOrder, PublicOrderItem, ReceiveDelivery,
        },
    },
};

/// Counter row that hands out barcode numbers
const BARCODE_COUNTER: &str = "next_book_id";

#[derive(Clone)]
pub struct OrdersRepository {
    pool: Pool<Postgres>,
}

impl OrdersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Place an order and issue one barcode per ordered copy.
    ///
    /// The counter row stays locked until commit, so concurrent orders are
    /// serialized and draw disjoint barcode ranges. The counter is written
    /// back exactly once.
    pub async fn create(
        &self,
        order_date: NaiveDate,
        supplier_id: Option<i32>,
        lines: &[OrderLine],
        barcode_prefix: &str,
    ) -> AppResult<CreatedOrder> {
        let mut tx = self.pool.begin().await?;

        let next_id: Option<i64> = sqlx::query_scalar(
            "SELECT counter_value FROM app_counters WHERE counter_key = $1 FOR UPDATE",
        )
        .bind(BARCODE_COUNTER)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(next_id) = next_id else {
            return abort(
                tx,
                AppError::Internal(format!("Counter '{}' is missing", BARCODE_COUNTER)),
            )
            .await;
        };

        if let Some(supplier_id) = supplier_id {
            let known: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
                    .bind(supplier_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !known {
                return abort(
                    tx,
                    AppError::NotFound(format!("Supplier {} not found", supplier_id)),
                )
                .await;
            }
        }

        let public_token = Uuid::new_v4().simple().to_string();
        let order_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (order_date, supplier_id, public_token, status)
            VALUES ($1, $2, $3, 'ordered')
            RETURNING id
            "#,
        )
        .bind(order_date)
        .bind(supplier_id)
        .bind(&public_token)
        .fetch_one(&mut *tx)
        .await?;

        let (items, next_free) = allocate_barcodes(barcode_prefix, next_id, lines);

        let mut isbns = Vec::with_capacity(items.len());
        let mut titles = Vec::with_capacity(items.len());
        let mut authors = Vec::with_capacity(items.len());
        let mut barcodes = Vec::with_capacity(items.len());
        for item in items {
            isbns.push(item.isbn);
            titles.push(item.title);
            authors.push(item.author);
            barcodes.push(item.library_barcode_id);
        }

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, isbn, title, author, library_barcode_id)
            SELECT $1, isbn, title, author, barcode
            FROM UNNEST($2::varchar[], $3::varchar[], $4::varchar[], $5::varchar[])
                AS i(isbn, title, author, barcode)
            "#,
        )
        .bind(order_id)
        .bind(&isbns)
        .bind(&titles)
        .bind(&authors)
        .bind(&barcodes)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE app_counters SET counter_value = $2 WHERE counter_key = $1")
            .bind(BARCODE_COUNTER)
            .bind(next_free)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CreatedOrder {
            order_id,
            generated_ids: barcodes,
            public_token,
        })
    }

    /// Order headers with supplier name and copy counters, newest first
    pub async fn list(&self) -> AppResult<Vec<OrderSummary>> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT o.id, o.order_date, o.supplier_id, s.name AS supplier_name, o.status,
                   COUNT(i.id) AS copies,
                   COUNT(i.received_at) AS received,
                   o.created_at
            FROM orders o
            LEFT JOIN suppliers s ON s.id = o.supplier_id
            LEFT JOIN order_items i ON i.order_id = o.id
            GROUP BY o.id, s.name
            ORDER BY o.order_date DESC, o.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn items(&self, order_id: i32) -> AppResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Get order by ID, with supplier name and all items
    pub async fn get(&self, id: i32) -> AppResult<OrderDetails> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        let supplier_name: Option<String> = match order.supplier_id {
            Some(supplier_id) => {
                sqlx::query_scalar("SELECT name FROM suppliers WHERE id = $1")
                    .bind(supplier_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let items = self.items(order.id).await?;
        Ok(OrderDetails {
            order,
            supplier_name,
            items,
        })
    }

    /// Read-only view for whoever holds the order's public token
    pub async fn get_by_token(&self, token: &str) -> AppResult<PublicOrder> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE public_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let items = sqlx::query_as::<_, PublicOrderItem>(
            r#"
            SELECT title, author, isbn, library_barcode_id
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PublicOrder {
            order_id: order.id,
            order_date: order.order_date,
            supplier_id: order.supplier_id,
            items,
        })
    }

    /// Catalog books created from one order item
    pub async fn item_books(&self, item_id: i32) -> AppResult<Vec<Book>> {
        let known: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM order_items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.pool)
                .await?;
        if !known {
            return Err(AppError::NotFound(format!(
                "Order item {} not found",
                item_id
            )));
        }

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT t.*, s.name AS borrower_name
            FROM books t
            LEFT JOIN lendings l ON l.book_barcode = t.barcode AND l.status = 'active'
            LEFT JOIN students s ON s.id = l.student_id
            WHERE t.order_item_id = $1
            ORDER BY t.barcode
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Turn a delivered copy into a catalog book. Each item can be received once.
    pub async fn receive(&self, item_id: i32, delivery: &ReceiveDelivery) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE id = $1 FOR UPDATE",
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(item) = item else {
            return abort(
                tx,
                AppError::NotFound(format!("Order item {} not found", item_id)),
            )
            .await;
        };
        if item.received_at.is_some() {
            return abort(
                tx,
                AppError::Conflict(format!(
                    "Copy {} has already been received",
                    item.library_barcode_id
                )),
            )
            .await;
        }

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (barcode, isbn, title, author, signature, category_id, status, order_item_id)
            VALUES ($1, $2, $3, $4, $5, $6, 'available', $7)
            RETURNING *
            "#,
        )
        .bind(&item.library_barcode_id)
        .bind(&item.isbn)
        .bind(&item.title)
        .bind(&item.author)
        .bind(&delivery.signature)
        .bind(delivery.category_id)
        .bind(item.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE order_items SET received_at = NOW() WHERE id = $1")
            .bind(item.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE orders SET status = CASE
                WHEN NOT EXISTS (
                    SELECT 1 FROM order_items WHERE order_id = $1 AND received_at IS NULL
                ) THEN 'received'
                ELSE 'partially_received'
            END
            WHERE id = $1
            "#,
        )
        .bind(item.order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }
}
