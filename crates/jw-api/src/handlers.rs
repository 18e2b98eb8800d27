//! # jw-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the order services.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use jw_core::engine::{PaymentUpdate, StatusEngine, TrackingUpdate};
use jw_core::error::AppError;
use jw_core::models::{
    LineItem, NewOrder, Order, OrderQuery, OrderStatus, ShippingAddress, SortDirection, SortField,
    DEFAULT_PAGE_SIZE,
};
use jw_core::query::OrderQueryService;
use jw_core::traits::{AuthProvider, OrderRepo};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::error::ApiError;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub engine: StatusEngine,
    pub queries: OrderQueryService,
    pub auth: Box<dyn AuthProvider>,
}

impl AppState {
    /// Both services share the one store handle.
    pub fn new(repo: Arc<dyn OrderRepo>, auth: Box<dyn AuthProvider>) -> Self {
        Self {
            engine: StatusEngine::new(repo.clone()),
            queries: OrderQueryService::new(repo),
            auth,
        }
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    /// `status=all` (or no status) lists everything.
    fn into_query(self) -> Result<OrderQuery, AppError> {
        let status = match self.status.as_deref() {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(raw.parse::<OrderStatus>()?),
        };
        Ok(OrderQuery {
            status,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            sort_by: self.sort_by.as_deref().map(SortField::parse).unwrap_or_default(),
            direction: self.order.as_deref().map(SortDirection::parse).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub is_paid: bool,
    pub payment_reference: Option<String>,
    pub payment_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub tracking_number: String,
    pub tracking_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRequest {
    #[serde(default)]
    pub admin_notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Unparseable ids cannot name an order, so they are reported as missing.
fn order_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| AppError::order_not_found(raw).into())
}

fn updated(message: &str, order: Order) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": message, "order": order }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Checkout. The caller becomes the owner.
pub async fn create_order(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateOrderRequest>,
) -> ApiResult {
    let body = body.into_inner();
    let order = data
        .queries
        .create_order(NewOrder {
            owner: user.0.user_id,
            line_items: body.line_items,
            shipping_address: body.shipping_address,
            payment_method: body.payment_method,
            total_amount: body.total_amount,
        })
        .await?;

    log::info!("order {} placed by {}", order.id, order.owner);
    Ok(HttpResponse::Created().json(order))
}

pub async fn my_orders(data: web::Data<AppState>, user: AuthenticatedUser) -> ApiResult {
    let orders = data.queries.list_for_owner(user.0.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn get_order(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult {
    let id = order_id(&path)?;
    let order = data.queries.get_by_id(id, &user.0).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn list_orders(
    data: web::Data<AppState>,
    _admin: AdminUser,
    params: web::Query<ListParams>,
) -> ApiResult {
    let query = params.into_inner().into_query()?;
    let page = data.queries.list_all(query).await?;

    Ok(HttpResponse::Ok().json(json!({
        "orders": page.orders,
        "pagination": {
            "total": page.total,
            "page": page.page,
            "pages": page.pages,
            "limit": page.limit,
        }
    })))
}

pub async fn update_status(
    data: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<StatusRequest>,
) -> ApiResult {
    let id = order_id(&path)?;
    let order = data
        .engine
        .set_status(id, &body.status, body.note.as_deref(), admin.0.user_id)
        .await?;

    log::info!("order {} status set to '{}' by {}", id, order.status, admin.0.user_id);
    Ok(updated("Order status updated", order))
}

pub async fn update_payment(
    data: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<PaymentRequest>,
) -> ApiResult {
    let id = order_id(&path)?;
    let body = body.into_inner();
    let order = data
        .engine
        .set_payment_status(
            id,
            PaymentUpdate {
                is_paid: body.is_paid,
                payment_reference: body.payment_reference,
                payment_metadata: body.payment_metadata,
            },
            admin.0.user_id,
        )
        .await?;

    log::info!("order {} payment set to paid={} by {}", id, order.is_paid, admin.0.user_id);
    Ok(updated("Payment status updated", order))
}

pub async fn update_tracking(
    data: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<TrackingRequest>,
) -> ApiResult {
    let id = order_id(&path)?;
    let body = body.into_inner();
    let order = data
        .engine
        .set_tracking(
            id,
            TrackingUpdate {
                carrier: body.carrier,
                tracking_number: body.tracking_number,
                tracking_url: body.tracking_url,
            },
            admin.0.user_id,
        )
        .await?;

    log::info!("order {} tracking updated by {}", id, admin.0.user_id);
    Ok(updated("Tracking information updated", order))
}

pub async fn update_notes(
    data: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<NotesRequest>,
) -> ApiResult {
    let id = order_id(&path)?;
    let order = data
        .engine
        .set_admin_notes(id, body.into_inner().admin_notes)
        .await?;

    log::info!("order {} admin notes updated by {}", id, admin.0.user_id);
    Ok(updated("Admin notes updated", order))
}

impl CancelRequest {
    /// An empty body means "no reason given"; anything else must be a valid request.
    fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::ValidationError(format!("Invalid cancel request: {}", e)))
    }
}

/// The body is optional; without one the default cancellation note is used.
pub async fn cancel_order(
    data: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult {
    let id = order_id(&path)?;
    let body = CancelRequest::from_body(&body)?;
    let order = data
        .engine
        .cancel(id, body.reason.as_deref(), admin.0.user_id)
        .await?;

    log::info!("order {} cancelled by {}", id, admin.0.user_id);
    Ok(updated("Order cancelled", order))
}
