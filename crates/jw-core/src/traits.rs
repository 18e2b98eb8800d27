//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Order, OrderQuery, Requester};

/// Data persistence contract for orders.
///
/// The store owns `created_at`/`updated_at`: `insert_order` and `save_order`
/// stamp them and hand back the record as stored.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn insert_order(&self, order: Order) -> anyhow::Result<Order>;
    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>>;
    /// Overwrites the whole document. Last write wins.
    async fn save_order(&self, order: Order) -> anyhow::Result<Order>;

    /// Orders placed by `owner`, newest first.
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Order>>;
    /// One page of orders matching `query`, plus the total match count.
    async fn list_orders(&self, query: &OrderQuery) -> anyhow::Result<(Vec<Order>, u64)>;
}

/// Identity contract. Credential storage and login live outside this service.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Mints a bearer token for a user
    fn issue_token(&self, user_id: Uuid, is_admin: bool) -> String;

    /// Resolves a bearer token to its caller, or `None` if it is not genuine
    fn verify_token(&self, token: &str) -> Option<Requester>;
}
