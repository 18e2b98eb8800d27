//! In-memory `OrderRepo` for tests in this and downstream crates.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{LineItem, NewOrder, Order, OrderQuery, ShippingAddress, SortDirection, SortField};
use crate::traits::OrderRepo;

#[derive(Default)]
pub struct MemoryOrderRepo {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl MemoryOrderRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an order as-is, keeping whatever timestamps it carries.
    pub fn seed(&self, order: Order) {
        self.lock().insert(order.id, order);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Order>> {
        self.orders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn compare(a: &Order, b: &Order, field: SortField) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl OrderRepo for MemoryOrderRepo {
    async fn insert_order(&self, mut order: Order) -> anyhow::Result<Order> {
        let now = Utc::now();
        order.created_at = now;
        order.updated_at = now;
        self.lock().insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn save_order(&self, mut order: Order) -> anyhow::Result<Order> {
        order.updated_at = Utc::now();
        self.lock().insert(order.id, order.clone());
        Ok(order)
    }

    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .lock()
            .values()
            .filter(|o| o.owner == owner)
            .cloned()
            .collect();
        orders.sort_by(|a, b| compare(b, a, SortField::CreatedAt));
        Ok(orders)
    }

    async fn list_orders(&self, query: &OrderQuery) -> anyhow::Result<(Vec<Order>, u64)> {
        let mut matching: Vec<Order> = self
            .lock()
            .values()
            .filter(|o| query.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| match query.direction {
            SortDirection::Asc => compare(a, b, query.sort_by),
            SortDirection::Desc => compare(b, a, query.sort_by),
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }
}

/// A one-line checkout: two rings at 100 each, total 200.
pub fn ring_order(owner: Uuid) -> NewOrder {
    NewOrder {
        owner,
        line_items: vec![LineItem {
            product_ref: "prod-ring-01".to_string(),
            name: "Ring".to_string(),
            quantity: 2,
            unit_price: 100.0,
            image_url: None,
        }],
        shipping_address: ShippingAddress {
            full_name: "Ada Lovelace".to_string(),
            street: "12 Hatton Garden".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            postal_code: "EC1N 8AN".to_string(),
            country: "GB".to_string(),
            phone: None,
        },
        payment_method: "card".to_string(),
        total_amount: 200.0,
    }
}
