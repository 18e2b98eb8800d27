//! # Domain Models
//!
//! The order document and everything embedded in it.
//! We use UUID v7 so order ids sort by creation time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Fulfillment state of an order. Serialized as the exact display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Order Confirmed")]
    OrderConfirmed,
    #[serde(rename = "Payment Processing")]
    PaymentProcessing,
    #[serde(rename = "Order Processing")]
    OrderProcessing,
    #[serde(rename = "Order Shipped")]
    OrderShipped,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::OrderConfirmed,
        OrderStatus::PaymentProcessing,
        OrderStatus::OrderProcessing,
        OrderStatus::OrderShipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::OrderConfirmed => "Order Confirmed",
            OrderStatus::PaymentProcessing => "Payment Processing",
            OrderStatus::OrderProcessing => "Order Processing",
            OrderStatus::OrderShipped => "Order Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    /// Case-sensitive match against the wire strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let accepted: Vec<&str> = OrderStatus::ALL.iter().map(|st| st.as_str()).collect();
                AppError::ValidationError(format!(
                    "invalid status '{}', expected one of: {}",
                    s,
                    accepted.join(", ")
                ))
            })
    }
}

/// One purchased product, captured at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Catalog id of the product; the catalog itself lives elsewhere
    pub product_ref: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// An audit record; written on creation and on every status or payment change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: String,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
    pub tracking_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A single purchase with its payment and fulfillment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub owner: Uuid,
    pub line_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub payment_metadata: Option<serde_json::Value>,
    /// Client-submitted cart total. Stored verbatim, never recomputed from `line_items`.
    pub total_amount: f64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub tracking: Option<TrackingInfo>,
    /// Staff-only. Cleared by [`Order::for_viewer`] and omitted from the wire when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub admin_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checkout input for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner: Uuid,
    pub line_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_amount: f64,
}

impl Order {
    /// Builds a freshly placed order with its seed history entry.
    pub fn place(new: NewOrder, now: DateTime<Utc>) -> crate::Result<Self> {
        if new.line_items.is_empty() {
            return Err(AppError::ValidationError("No order items".to_string()));
        }

        let mut order = Order {
            id: Uuid::now_v7(),
            owner: new.owner,
            line_items: new.line_items,
            shipping_address: new.shipping_address,
            payment_method: new.payment_method,
            payment_reference: None,
            payment_metadata: None,
            total_amount: new.total_amount,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            status: OrderStatus::OrderConfirmed,
            status_history: Vec::new(),
            tracking: None,
            admin_notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        order.record(OrderStatus::OrderConfirmed, "Order placed", new.owner, now);
        Ok(order)
    }

    /// The order as `viewer` may see it: customers never see admin notes.
    pub fn for_viewer(mut self, viewer: &Requester) -> Self {
        if !viewer.is_admin {
            self.admin_notes.clear();
        }
        self
    }

    /// Appends to the status history. The history is never rewritten.
    pub fn record(&mut self, status: OrderStatus, note: impl Into<String>, actor: Uuid, at: DateTime<Utc>) {
        self.status_history.push(StatusHistoryEntry {
            status,
            timestamp: at,
            note: note.into(),
            updated_by: actor,
        });
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Requester {
    pub fn can_view(&self, order: &Order) -> bool {
        self.is_admin || order.owner == self.user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    TotalAmount,
    Status,
}

impl SortField {
    /// Unknown field names fall back to `CreatedAt`.
    pub fn parse(name: &str) -> Self {
        match name {
            "updatedAt" => SortField::UpdatedAt,
            "totalAmount" => SortField::TotalAmount,
            "status" => SortField::Status,
            _ => SortField::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// Filter, page and sort for the administrator listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub direction: SortDirection,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: SortField::default(),
            direction: SortDirection::default(),
        }
    }
}

impl OrderQuery {
    /// Clamps `page` to at least 1 and `limit` to `1..=MAX_PAGE_SIZE`.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// A page of orders plus the metadata needed to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub limit: u32,
}

impl OrderPage {
    pub fn new(orders: Vec<Order>, total: u64, query: &OrderQuery) -> Self {
        let limit = u64::from(query.limit.max(1));
        let pages = total.div_ceil(limit);
        Self {
            orders,
            total,
            page: query.page,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
            limit: query.limit,
        }
    }
}
