//! Supplier orders and barcode issuance

use validator::Validate;

use crate::{
    config::OrdersConfig,
    error::{AppError, AppResult},
    models::{
        book::Book,
        order::{
            CreateOrder, CreatedOrder, OrderDetails, OrderLine, OrderSummary, PublicOrder,
            ReceiveDelivery,
        },
        user::Identity,
    },
    repository::Repository,
};

/// Copies requested by an order, refusing orders above `max`
pub fn total_copies(lines: &[OrderLine], max: usize) -> AppResult<usize> {
    let total: usize = lines.iter().map(|l| l.quantity as usize).sum();
    if total > max {
        return Err(AppError::Validation(format!(
            "An order may contain at most {} copies ({} requested)",
            max, total
        )));
    }
    Ok(total)
}

#[derive(Clone)]
pub struct OrdersService {
    repository: Repository,
    config: OrdersConfig,
}

impl OrdersService {
    pub fn new(repository: Repository, config: OrdersConfig) -> Self {
        Self { repository, config }
    }

    /// Place an order; every ordered copy gets its library barcode now
    pub async fn create(&self, identity: &Identity, order: &CreateOrder) -> AppResult<CreatedOrder> {
        order.validate()?;
        let copies = total_copies(&order.items, self.config.max_copies_per_order)?;

        let created = self
            .repository
            .orders
            .create(
                order.order_date,
                order.supplier_id,
                &order.items,
                &self.config.barcode_prefix,
            )
            .await?;

        tracing::info!(
            order_id = created.order_id,
            copies,
            first = created.generated_ids.first().map(String::as_str),
            last = created.generated_ids.last().map(String::as_str),
            ordered_by = identity.user_id,
            "Order placed"
        );
        Ok(created)
    }

    pub async fn list(&self) -> AppResult<Vec<OrderSummary>> {
        self.repository.orders.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<OrderDetails> {
        self.repository.orders.get(id).await
    }

    /// Capability lookup; the token is the only credential
    pub async fn get_by_token(&self, token: &str) -> AppResult<PublicOrder> {
        self.repository.orders.get_by_token(token.trim()).await
    }

    /// Materialize a delivered copy as an available book
    pub async fn receive(&self, item_id: i32, delivery: &ReceiveDelivery) -> AppResult<Book> {
        if let Some(category_id) = delivery.category_id {
            if !self.repository.categories.exists(category_id).await? {
                return Err(AppError::NotFound(format!(
                    "Category {} not found",
                    category_id
                )));
            }
        }

        let book = self.repository.orders.receive(item_id, delivery).await?;
        tracing::info!(item_id, barcode = %book.barcode, "Order item received");
        Ok(book)
    }

    pub async fn item_books(&self, item_id: i32) -> AppResult<Vec<Book>> {
        self.repository.orders.item_books(item_id).await
    }
}
