//! # Order Query Service
//!
//! Checkout plus the read side: single lookups, a purchaser's own
//! history, and the paginated administrator listing.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{NewOrder, Order, OrderPage, OrderQuery, Requester};
use crate::traits::OrderRepo;

pub struct OrderQueryService {
    repo: Arc<dyn OrderRepo>,
}

impl OrderQueryService {
    pub fn new(repo: Arc<dyn OrderRepo>) -> Self {
        Self { repo }
    }

    /// Places an order. `total_amount` is taken as submitted; it is not
    /// checked against the line items.
    pub async fn create_order(&self, new: NewOrder) -> Result<Order> {
        let order = Order::place(new, Utc::now())?;
        Ok(self.repo.insert_order(order).await?)
    }

    /// Only the owner or an administrator may read an order.
    pub async fn get_by_id(&self, id: Uuid, requester: &Requester) -> Result<Order> {
        let order = self
            .repo
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::order_not_found(id))?;

        if !requester.can_view(&order) {
            return Err(AppError::Forbidden("Not authorized to view this order".to_string()));
        }
        Ok(order.for_viewer(requester))
    }

    /// The customer's own order history, without admin notes.
    pub async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Order>> {
        let viewer = Requester { user_id: owner, is_admin: false };
        let orders = self.repo.list_by_owner(owner).await?;
        Ok(orders.into_iter().map(|o| o.for_viewer(&viewer)).collect())
    }

    pub async fn list_all(&self, query: OrderQuery) -> Result<OrderPage> {
        let query = query.normalized();
        let (orders, total) = self.repo.list_orders(&query).await?;
        Ok(OrderPage::new(orders, total, &query))
    }
}
