//! # Transition Rules
//!
//! The secondary effects of order mutations, one named rule each. The
//! engine composes these; none of them touch storage.

use crate::error::{AppError, Result};
use crate::models::{Order, OrderStatus};

/// A confirmed payment moves a freshly confirmed order into payment processing.
pub fn payment_auto_advance(current: OrderStatus, is_paid: bool) -> Option<OrderStatus> {
    match (is_paid, current) {
        (true, OrderStatus::OrderConfirmed) => Some(OrderStatus::PaymentProcessing),
        _ => None,
    }
}

/// Complete tracking details ship the order unless it is already shipped or delivered.
///
/// Cancelled orders are not exempt.
pub fn tracking_auto_advance(
    current: OrderStatus,
    carrier: &str,
    tracking_number: &str,
) -> Option<OrderStatus> {
    if carrier.trim().is_empty() || tracking_number.trim().is_empty() {
        return None;
    }
    match current {
        OrderStatus::OrderShipped | OrderStatus::Delivered => None,
        OrderStatus::OrderConfirmed
        | OrderStatus::PaymentProcessing
        | OrderStatus::OrderProcessing
        | OrderStatus::Cancelled => Some(OrderStatus::OrderShipped),
    }
}

/// Whether entering `status` flags the order as delivered.
pub fn marks_delivered(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Delivered)
}

pub fn ensure_cancellable(order: &Order) -> Result<()> {
    if order.is_delivered {
        return Err(AppError::InvalidOperation(
            "Cannot cancel an order that has been delivered".to_string(),
        ));
    }
    Ok(())
}

pub fn default_status_note(status: OrderStatus) -> String {
    format!("Status updated to {status}")
}

pub fn payment_note(is_paid: bool) -> &'static str {
    if is_paid {
        "Payment confirmed"
    } else {
        "Payment marked as pending"
    }
}

/// History status for a payment change: payment processing when paid,
/// otherwise whatever the order was in before the update.
pub fn payment_history_status(current: OrderStatus, is_paid: bool) -> OrderStatus {
    if is_paid {
        OrderStatus::PaymentProcessing
    } else {
        current
    }
}

pub fn tracking_note(carrier: &str, tracking_number: &str) -> String {
    format!("Order shipped via {carrier}. Tracking number: {tracking_number}")
}

pub const DEFAULT_CANCEL_NOTE: &str = "Order cancelled";
