//! Categories and suppliers repositories

use sqlx::{Pool, Postgres};

use super::table::{Record, Table};
use crate::{
    error::{AppError, AppResult},
    models::catalog::{Category, CategoryWithCounts, Supplier, SupplierInput, SupplierWithCounts},
};

impl Record for Category {
    const LABEL: &'static str = "Category";
    const TABLE: &'static str = "categories";
    const KEY: &'static str = "id";
    const SEARCH_COLUMNS: &'static [&'static str] = &["t.name"];
    const ORDER_BY: &'static str = "t.name ASC";
}

impl Record for Supplier {
    const LABEL: &'static str = "Supplier";
    const TABLE: &'static str = "suppliers";
    const KEY: &'static str = "id";
    const SEARCH_COLUMNS: &'static [&'static str] = &["t.name", "t.contact_person", "t.email"];
    const ORDER_BY: &'static str = "t.name ASC";
}

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
    table: Table<Category>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            table: Table::new(pool.clone()),
            pool,
        }
    }

    /// All categories with their book counters
    pub async fn list(&self) -> AppResult<Vec<CategoryWithCounts>> {
        let categories = sqlx::query_as::<_, CategoryWithCounts>(
            r#"
            SELECT c.id, c.name,
                   COUNT(b.barcode) AS total_books,
                   COUNT(b.barcode) FILTER (WHERE b.status = 'available') AS available_books
            FROM categories c
            LEFT JOIN books b ON b.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn get(&self, id: i32) -> AppResult<Category> {
        self.table.get(id).await
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        self.table.exists(id).await
    }

    pub async fn create(&self, name: &str) -> AppResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING *",
        )
        .bind(name.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    /// Delete a category; its books become uncategorized
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.table.delete(id).await
    }
}

#[derive(Clone)]
pub struct SuppliersRepository {
    pool: Pool<Postgres>,
    table: Table<Supplier>,
}

impl SuppliersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            table: Table::new(pool.clone()),
            pool,
        }
    }

    /// All suppliers with ordered and delivered copy counts
    pub async fn list(&self) -> AppResult<Vec<SupplierWithCounts>> {
        let suppliers = sqlx::query_as::<_, SupplierWithCounts>(
            r#"
            SELECT s.id, s.name, s.contact_person, s.email, s.phone, s.notes,
                   COUNT(i.id) AS ordered_copies,
                   COUNT(i.received_at) AS received_copies
            FROM suppliers s
            LEFT JOIN orders o ON o.supplier_id = s.id
            LEFT JOIN order_items i ON i.order_id = o.id
            GROUP BY s.id
            ORDER BY s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    pub async fn get(&self, id: i32) -> AppResult<Supplier> {
        self.table.get(id).await
    }

    pub async fn create(&self, supplier: &SupplierInput) -> AppResult<Supplier> {
        let created = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, contact_person, email, phone, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(supplier.name.trim())
        .bind(&supplier.contact_person)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update(&self, id: i32, supplier: &SupplierInput) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $2, contact_person = $3, email = $4, phone = $5, notes = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(supplier.name.trim())
        .bind(&supplier.contact_person)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Supplier {} not found", id)))
    }

    /// Delete a supplier no order refers to
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE supplier_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if orders > 0 {
            return Err(AppError::Conflict(format!(
                "Supplier {} is referenced by {} order(s)",
                id, orders
            )));
        }
        // An order placed in between still trips the foreign key (Conflict)
        self.table.delete(id).await
    }
}
