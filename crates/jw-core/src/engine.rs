//! # Status Engine
//!
//! Administrator mutations of an existing order. Every operation is one
//! load and one save of the order document; nothing is saved when an
//! operation fails, so a failed call leaves the stored order untouched.
//!
//! There is no adjacency check in [`StatusEngine::set_status`]: any
//! status can be set from any other, including out of `Delivered`.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Order, OrderStatus, TrackingInfo};
use crate::rules;
use crate::traits::OrderRepo;

/// Payment flag change requested by an administrator.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub is_paid: bool,
    /// Overwrites the stored reference when present
    pub payment_reference: Option<String>,
    /// Overwrites the stored metadata when present
    pub payment_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackingUpdate {
    pub carrier: String,
    pub tracking_number: String,
    pub tracking_url: Option<String>,
}

pub struct StatusEngine {
    repo: Arc<dyn OrderRepo>,
}

impl StatusEngine {
    pub fn new(repo: Arc<dyn OrderRepo>) -> Self {
        Self { repo }
    }

    async fn load(&self, id: Uuid) -> Result<Order> {
        self.repo
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::order_not_found(id))
    }

    async fn store(&self, order: Order) -> Result<Order> {
        Ok(self.repo.save_order(order).await?)
    }

    /// Sets the status from its wire string and records it in the history.
    /// Entering `Delivered` also flags the order as delivered.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: &str,
        note: Option<&str>,
        actor: Uuid,
    ) -> Result<Order> {
        let status: OrderStatus = status.parse()?;
        let mut order = self.load(id).await?;
        let now = Utc::now();

        order.status = status;
        let note = note
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| rules::default_status_note(status));
        order.record(status, note, actor, now);

        if rules::marks_delivered(status) {
            order.is_delivered = true;
            order.delivered_at = Some(now);
        }

        self.store(order).await
    }

    pub async fn set_payment_status(
        &self,
        id: Uuid,
        update: PaymentUpdate,
        actor: Uuid,
    ) -> Result<Order> {
        let mut order = self.load(id).await?;
        let now = Utc::now();
        let current = order.status;

        order.is_paid = update.is_paid;
        order.paid_at = update.is_paid.then_some(now);
        if let Some(reference) = update.payment_reference {
            order.payment_reference = Some(reference);
        }
        if let Some(metadata) = update.payment_metadata {
            order.payment_metadata = Some(metadata);
        }

        order.record(
            rules::payment_history_status(current, update.is_paid),
            rules::payment_note(update.is_paid),
            actor,
            now,
        );
        if let Some(next) = rules::payment_auto_advance(current, update.is_paid) {
            order.status = next;
        }

        self.store(order).await
    }

    /// Replaces the tracking record. Complete details ship the order.
    pub async fn set_tracking(
        &self,
        id: Uuid,
        update: TrackingUpdate,
        actor: Uuid,
    ) -> Result<Order> {
        let mut order = self.load(id).await?;
        let now = Utc::now();

        if let Some(next) =
            rules::tracking_auto_advance(order.status, &update.carrier, &update.tracking_number)
        {
            order.status = next;
            order.record(
                next,
                rules::tracking_note(&update.carrier, &update.tracking_number),
                actor,
                now,
            );
        }
        order.tracking = Some(TrackingInfo {
            carrier: update.carrier,
            tracking_number: update.tracking_number,
            tracking_url: update.tracking_url,
            updated_at: now,
        });

        self.store(order).await
    }

    /// Cancels anything that has not been delivered.
    pub async fn cancel(&self, id: Uuid, reason: Option<&str>, actor: Uuid) -> Result<Order> {
        let mut order = self.load(id).await?;
        rules::ensure_cancellable(&order)?;

        let note = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(rules::DEFAULT_CANCEL_NOTE);
        order.status = OrderStatus::Cancelled;
        order.record(OrderStatus::Cancelled, note, actor, Utc::now());

        self.store(order).await
    }

    /// Overwrites the administrator notes verbatim. Not recorded in the history.
    pub async fn set_admin_notes(&self, id: Uuid, notes: String) -> Result<Order> {
        let mut order = self.load(id).await?;
        order.admin_notes = notes;
        self.store(order).await
    }
}
